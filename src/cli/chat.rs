//! Chat command - streams a completion to stdout

use std::io::Write;

use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{build_messages, Context};
use crate::domain::{
    CompletionCallbacks, CompletionMetadata, DomainError, GenerationConfig, StreamChunk,
};
use crate::infrastructure::services::{CompletionService, StreamSettings};

/// Arguments for the chat command
#[derive(Args, Clone)]
pub struct ChatArgs {
    /// Provider id, e.g. `ollama`, `lmstudio` or `google-gemini`
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

    #[arg(long)]
    pub top_k: Option<u32>,

    #[arg(long)]
    pub top_p: Option<f32>,

    /// Print reasoning chunks to stderr
    #[arg(long)]
    pub show_reasoning: bool,
}

impl ChatArgs {
    pub fn generation(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: self.temperature,
            top_k: self.top_k,
            top_p: self.top_p,
        }
    }
}

/// Run the chat command
pub async fn run(args: ChatArgs) -> anyhow::Result<()> {
    let context = Context::load()?;
    let provider = context.registry.get_required(&args.provider)?;

    let settings = StreamSettings {
        idle_timeout: context.config.stream.idle_timeout(),
    };
    let service = CompletionService::new(context.http_client.clone()).with_settings(settings);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, cancelling completion");
            trigger.cancel();
        }
    });

    let generation = args.generation();
    let messages = build_messages(args.system.as_deref(), &args.prompt);
    let show_reasoning = args.show_reasoning;

    let mut failure: Option<DomainError> = None;
    let mut finished: Option<CompletionMetadata> = None;
    {
        let mut handler = CompletionCallbacks::new(
            |chunk: StreamChunk| match chunk {
                StreamChunk::Content(text) => {
                    let mut stdout = std::io::stdout().lock();
                    let _ = stdout.write_all(text.as_bytes());
                    let _ = stdout.flush();
                }
                StreamChunk::Reasoning(text) if show_reasoning => eprint!("{}", text),
                StreamChunk::Reasoning(_) => {}
            },
            |error: DomainError| failure = Some(error),
            |metadata: CompletionMetadata| finished = Some(metadata),
        );

        service
            .stream_chat_completion(
                provider,
                &context.credentials,
                &args.model,
                &messages,
                &cancel,
                &mut handler,
                (!generation.is_empty()).then_some(generation),
            )
            .await;
    }
    println!();

    if let Some(error) = failure {
        return Err(error.into());
    }

    match finished {
        Some(metadata) if metadata.is_empty() && cancel.is_cancelled() => {
            eprintln!("[cancelled]");
        }
        Some(metadata) => print_stats(&metadata),
        None => {}
    }

    Ok(())
}

fn print_stats(metadata: &CompletionMetadata) {
    if let Some(usage) = metadata.usage {
        eprintln!(
            "[tokens: prompt {} / completion {} / total {}]",
            usage.prompt_tokens.map_or("-".to_string(), |n| n.to_string()),
            usage.completion_tokens.map_or("-".to_string(), |n| n.to_string()),
            usage.total_tokens.map_or("-".to_string(), |n| n.to_string()),
        );
    }

    if let Some(speed) = metadata.speed {
        eprintln!("[{:.1} tokens/s]", speed);
    }
}
