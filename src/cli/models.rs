//! Models command - lists provider models

use clap::Args;

use super::Context;
use crate::infrastructure::services::ModelService;

/// Arguments for the models command
#[derive(Args, Clone)]
pub struct ModelsArgs {
    /// Provider id
    pub provider: String,

    /// Print the listing as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the models command
pub async fn run(args: ModelsArgs) -> anyhow::Result<()> {
    let context = Context::load()?;
    let provider = context.registry.get_required(&args.provider)?;
    let service = ModelService::new(context.http_client.clone());

    let models = service.fetch_models(provider, &context.credentials).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&models)?);
        return Ok(());
    }

    for model in &models {
        println!("{:<48} {}", model.id, model.owned_by);
    }

    Ok(())
}
