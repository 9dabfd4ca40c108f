use async_trait::async_trait;
use serde::Deserialize;

use super::http_client::HttpClientTrait;
use super::sse::{decode_stream, FrameFormat};
use crate::domain::{ChatRequest, ChatTransport, DomainError, EventStream, ProtocolType};

const PROVIDER: &str = "openai-compatible";

/// `/chat/completions` transport for OpenAI, LM Studio and Ollama's `/v1` layer
#[derive(Debug)]
pub struct OpenAiCompatibleTransport<C: HttpClientTrait> {
    client: C,
    auth_header: Option<String>,
    base_url: String,
}

impl<C: HttpClientTrait> OpenAiCompatibleTransport<C> {
    pub fn new(client: C, base_url: impl Into<String>, api_key: Option<&str>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let auth_header = api_key.map(|key| format!("Bearer {}", key));

        Self {
            client,
            auth_header,
            base_url,
        }
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_request(&self, request: &ChatRequest, stream: bool) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "stream": stream,
        });

        if let Some(temp) = request.generation.temperature {
            body["temperature"] = serde_json::json!(temp);
        }

        if let Some(top_k) = request.generation.top_k {
            body["top_k"] = serde_json::json!(top_k);
        }

        if let Some(top_p) = request.generation.top_p {
            body["top_p"] = serde_json::json!(top_p);
        }

        body
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        let mut headers = vec![("Content-Type", "application/json")];

        if let Some(ref auth) = self.auth_header {
            headers.push(("Authorization", auth.as_str()));
        }

        headers
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<String, DomainError> {
        let response: OpenAiResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider(PROVIDER, format!("Failed to parse response: {}", e))
        })?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| DomainError::provider(PROVIDER, "No content in completion response"))
    }
}

#[async_trait]
impl<C: HttpClientTrait> ChatTransport for OpenAiCompatibleTransport<C> {
    async fn open_stream(&self, request: &ChatRequest) -> Result<EventStream, DomainError> {
        let url = self.chat_completions_url();
        let body = self.build_request(request, true);

        tracing::debug!(url = %url, model = %request.model, "Opening chat completion stream");

        let bytes = self
            .client
            .post_json_stream(&url, self.headers(), &body)
            .await?;

        Ok(decode_stream(PROVIDER, bytes, FrameFormat::Sse))
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, DomainError> {
        let url = self.chat_completions_url();
        let body = self.build_request(request, false);

        let response = self.client.post_json(&url, self.headers(), &body).await?;

        self.parse_response(response)
    }

    fn protocol(&self) -> ProtocolType {
        ProtocolType::OpenAiCompatible
    }
}

// OpenAI API types

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}
