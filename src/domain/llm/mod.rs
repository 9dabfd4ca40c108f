//! Chat completion domain models and traits

mod handler;
mod message;
mod model;
mod request;
mod response;
mod transport;
mod usage;

pub use handler::{CompletionCallbacks, CompletionEvent, CompletionHandler};
pub use message::{ContentPart, ImageUrl, Message, MessageContent, MessageRole};
pub use model::{Model, ModelDetails};
pub use request::{ChatRequest, GenerationConfig};
pub use response::{CompletionMetadata, StreamChunk, Usage};
pub use transport::{ChatTransport, EventStream, TransportEvent};
pub use usage::{tokens_per_second, UsageAccumulator};

#[cfg(test)]
pub use handler::recording::RecordingHandler;
#[cfg(test)]
pub use transport::mock::MockTransport;
