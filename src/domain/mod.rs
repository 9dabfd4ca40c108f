//! Domain layer - providers, messages, chunks and the transport contract

pub mod error;
pub mod llm;
pub mod provider;

pub use error::DomainError;
pub use llm::{
    tokens_per_second, ChatRequest, ChatTransport, CompletionCallbacks, CompletionEvent,
    CompletionHandler, CompletionMetadata, ContentPart, EventStream, GenerationConfig, ImageUrl,
    Message, MessageContent, MessageRole, Model, ModelDetails, StreamChunk, TransportEvent, Usage,
    UsageAccumulator,
};
pub use provider::{api_root, CredentialMap, ProtocolType, ProviderConfig, ProviderRegistry};

#[cfg(test)]
pub use llm::{MockTransport, RecordingHandler};
