//! Complete command - one-shot completion

use clap::Args;

use super::{build_messages, Context};
use crate::domain::GenerationConfig;
use crate::infrastructure::services::CompletionService;

/// Arguments for the complete command
#[derive(Args, Clone)]
pub struct CompleteArgs {
    /// Provider id
    pub provider: String,

    /// Model id as the provider names it
    pub model: String,

    /// User prompt
    pub prompt: String,

    /// System prompt
    #[arg(long)]
    pub system: Option<String>,

    #[arg(long)]
    pub temperature: Option<f32>,
}

/// Run the complete command
pub async fn run(args: CompleteArgs) -> anyhow::Result<()> {
    let context = Context::load()?;
    let provider = context.registry.get_required(&args.provider)?;
    let service = CompletionService::new(context.http_client.clone());

    let generation = args
        .temperature
        .map(|temperature| GenerationConfig::new().temperature(temperature));
    let messages = build_messages(args.system.as_deref(), &args.prompt);

    let text = service
        .generate_text_completion(
            provider,
            &context.credentials,
            &args.model,
            &messages,
            generation,
        )
        .await?;

    println!("{}", text);
    Ok(())
}
