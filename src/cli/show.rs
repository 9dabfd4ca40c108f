//! Show command - Ollama model details

use anyhow::bail;
use clap::Args;

use super::Context;
use crate::domain::ProtocolType;
use crate::infrastructure::services::ModelService;

/// Arguments for the show command
#[derive(Args, Clone)]
pub struct ShowArgs {
    /// Provider id of an Ollama server
    pub provider: String,

    /// Model name, e.g. `llama3:8b`
    pub model: String,
}

/// Run the show command
pub async fn run(args: ShowArgs) -> anyhow::Result<()> {
    let context = Context::load()?;
    let provider = context.registry.get_required(&args.provider)?;

    if provider.protocol_type() == ProtocolType::GoogleGemini {
        bail!("Provider '{}' is not an Ollama server", provider.id());
    }

    let service = ModelService::new(context.http_client.clone());
    let details = service
        .fetch_ollama_model_details(provider.base_url(), &args.model)
        .await?;

    println!("{}", serde_json::to_string_pretty(&details)?);
    Ok(())
}
