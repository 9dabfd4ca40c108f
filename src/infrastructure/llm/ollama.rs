use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::data_uri::parse_data_uri;
use super::http_client::HttpClientTrait;
use super::sse::{decode_stream, FrameFormat};
use crate::domain::{
    api_root, ChatRequest, ChatTransport, DomainError, EventStream, Message, MessageRole,
    ProtocolType,
};

const PROVIDER: &str = "ollama";

/// Ollama native `/api/chat` transport (NDJSON streaming)
#[derive(Debug)]
pub struct OllamaTransport<C: HttpClientTrait> {
    client: C,
    root_url: String,
}

impl<C: HttpClientTrait> OllamaTransport<C> {
    /// `base_url` may carry the `/v1` suffix of the OpenAI layer; it is stripped
    pub fn new(client: C, base_url: &str) -> Self {
        Self {
            client,
            root_url: api_root(base_url).to_string(),
        }
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.root_url)
    }

    fn build_request(&self, request: &ChatRequest, stream: bool) -> serde_json::Value {
        let messages: Vec<OllamaMessage> = request
            .messages
            .iter()
            .map(OllamaMessage::from_domain)
            .collect();

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": messages,
            "stream": stream,
        });

        if !request.generation.is_empty() {
            body["options"] = serde_json::to_value(request.generation).unwrap_or_default();
        }

        body
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![("Content-Type", "application/json")]
    }
}

#[async_trait]
impl<C: HttpClientTrait> ChatTransport for OllamaTransport<C> {
    async fn open_stream(&self, request: &ChatRequest) -> Result<EventStream, DomainError> {
        let url = self.chat_url();
        let body = self.build_request(request, true);

        tracing::debug!(url = %url, model = %request.model, "Opening Ollama chat stream");

        let bytes = self
            .client
            .post_json_stream(&url, self.headers(), &body)
            .await?;

        Ok(decode_stream(PROVIDER, bytes, FrameFormat::Ndjson))
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, DomainError> {
        let body = self.build_request(request, false);
        let json = self
            .client
            .post_json(&self.chat_url(), self.headers(), &body)
            .await?;

        let response: OllamaChatResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider(PROVIDER, format!("Failed to parse response: {}", e))
        })?;

        response
            .message
            .and_then(|m| m.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| DomainError::provider(PROVIDER, "No content in completion response"))
    }

    fn protocol(&self) -> ProtocolType {
        ProtocolType::Ollama
    }
}

// Ollama API types

#[derive(Debug, Serialize)]
struct OllamaMessage {
    role: &'static str,
    content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

impl OllamaMessage {
    fn from_domain(message: &Message) -> Self {
        let role = match message.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
        };

        // Ollama takes raw base64 without the data URI prefix
        let images = message
            .image_urls()
            .into_iter()
            .filter_map(parse_data_uri)
            .map(|image| image.data)
            .collect();

        Self {
            role,
            content: message.text(),
            images,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: Option<OllamaResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: Option<String>,
}
