use async_trait::async_trait;
use futures::Stream;
use std::fmt::Debug;
use std::pin::Pin;

use super::{ChatRequest, StreamChunk, Usage};
use crate::domain::{DomainError, ProtocolType};

/// What a transport decoder yields while a stream is open
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Chunk(StreamChunk),
    /// Usage reported inline or in a terminal frame
    Usage(Usage),
    /// Explicit terminal signal (`[DONE]`, `done: true`)
    Done,
}

/// Stream of decoded events for one call
pub type EventStream = Pin<Box<dyn Stream<Item = Result<TransportEvent, DomainError>> + Send>>;

/// One wire protocol strategy. Chosen once per call from the provider's protocol type.
#[async_trait]
pub trait ChatTransport: Send + Sync + Debug {
    /// Issue a streaming request; resolves once response headers arrive
    async fn open_stream(&self, request: &ChatRequest) -> Result<EventStream, DomainError>;

    /// Issue a non-streaming request and return the generated text
    async fn complete(&self, request: &ChatRequest) -> Result<String, DomainError>;

    fn protocol(&self) -> ProtocolType;
}
