//! LLM Stream Adapter
//!
//! One completion interface over three provider protocols:
//! - OpenAI-compatible `/chat/completions` with SSE streaming (OpenAI, LM Studio, Ollama `/v1`)
//! - Ollama native `/api/chat` with NDJSON streaming
//! - Google Gemini content generation
//!
//! Every backend is decoded into the same ordered chunk stream, with usage,
//! speed and reasoning collected for the final metadata and cancellation
//! through a `CancellationToken`.

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::DomainError;
pub use infrastructure::services::{CompletionService, ModelService, StreamSettings};
