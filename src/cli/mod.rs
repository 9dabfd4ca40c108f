//! CLI module for the LLM stream adapter
//!
//! Provides subcommands against any configured provider:
//! - `models`: list the models a provider serves
//! - `show`: Ollama model details
//! - `chat`: stream a completion to stdout (Ctrl+C cancels)
//! - `complete`: one-shot completion

pub mod chat;
pub mod complete;
pub mod models;
pub mod show;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::domain::{CredentialMap, Message, ProviderRegistry};
use crate::infrastructure::llm::HttpClient;
use crate::infrastructure::logging;

/// LLM stream adapter - one completion interface over OpenAI-compatible, Ollama and Gemini
#[derive(Parser)]
#[command(name = "llm-stream-adapter")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the models a provider serves
    Models(models::ModelsArgs),

    /// Show Ollama model details
    Show(show::ShowArgs),

    /// Stream a chat completion
    Chat(chat::ChatArgs),

    /// Run a one-shot completion
    Complete(complete::CompleteArgs),
}

/// State shared by every command
pub struct Context {
    pub config: AppConfig,
    pub registry: ProviderRegistry,
    pub credentials: CredentialMap,
    pub http_client: HttpClient,
}

impl Context {
    /// Load `.env` and configuration, then initialize logging
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = AppConfig::load().unwrap_or_default();
        logging::init_logging(&config.logging);

        let registry = config.registry();
        let credentials = config.credentials(&registry);
        let http_client = HttpClient::with_connect_timeout(config.http.connect_timeout())?;

        tracing::debug!(
            providers = registry.len(),
            credentials = credentials.len(),
            "Configuration loaded"
        );

        Ok(Self {
            config,
            registry,
            credentials,
            http_client,
        })
    }
}

/// System prompt (if any) followed by the user prompt
pub(crate) fn build_messages(system: Option<&str>, prompt: &str) -> Vec<Message> {
    system
        .filter(|s| !s.is_empty())
        .map(Message::system)
        .into_iter()
        .chain(std::iter::once(Message::user(prompt)))
        .collect()
}
