//! Infrastructure services

mod completion_service;
mod model_service;

pub use completion_service::{CompletionService, StreamSettings};
pub use model_service::{parse_num_ctx, ModelService};
