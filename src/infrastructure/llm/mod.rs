//! Chat transport implementations

mod data_uri;
mod factory;
mod gemini;
mod http_client;
mod ollama;
mod openai_compatible;
mod sse;

pub use data_uri::{parse_data_uri, InlineImage};
pub use factory::TransportFactory;
pub use gemini::{
    build_request as build_gemini_request, partition_turns, GeminiClient, GeminiRequest,
    GeminiTransport, HttpGeminiClient, TextStream, GEMINI_MODELS,
};
pub use http_client::{ByteStream, HttpClient, HttpClientTrait};
pub use ollama::OllamaTransport;
pub use openai_compatible::OpenAiCompatibleTransport;
pub use sse::{decode_lines, decode_payload, decode_stream, FrameFormat, LineDecoder};

#[cfg(test)]
pub use gemini::mock::MockGeminiClient;
#[cfg(test)]
pub use http_client::mock::MockHttpClient;
