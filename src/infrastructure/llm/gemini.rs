//! Google Gemini transport.
//!
//! Gemini is consumed through a client that yields text chunks, the shape its
//! SDKs expose. `HttpGeminiClient` implements it over the REST API.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::pin::Pin;

use super::data_uri::parse_data_uri;
use super::http_client::HttpClientTrait;
use super::sse::{decode_lines, FrameFormat};
use crate::domain::provider::GEMINI_PROVIDER_ID;
use crate::domain::{
    ChatRequest, ChatTransport, ContentPart, DomainError, EventStream, GenerationConfig, Message,
    MessageRole, ProtocolType, StreamChunk, TransportEvent,
};

const PROVIDER: &str = GEMINI_PROVIDER_ID;

/// Curated list served in place of a model listing endpoint
pub const GEMINI_MODELS: &[&str] = &[
    "gemini-2.5-pro",
    "gemini-2.5-flash",
    "gemini-2.5-flash-lite",
    "gemini-2.0-flash",
    "gemini-2.0-flash-lite",
    "gemini-1.5-pro",
    "gemini-1.5-flash",
];

/// Text chunks yielded by a Gemini stream
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, DomainError>> + Send>>;

/// Gemini content generation, in the shape of the vendor SDK
#[async_trait]
pub trait GeminiClient: Send + Sync + Debug {
    async fn stream_generate_content(
        &self,
        model: &str,
        request: &GeminiRequest,
    ) -> Result<TextStream, DomainError>;

    async fn generate_content(
        &self,
        model: &str,
        request: &GeminiRequest,
    ) -> Result<String, DomainError>;
}

// Gemini API types

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'static str>,
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GeminiPart {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    InlineData { inline_data: GeminiBlob },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiBlob {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

impl From<GenerationConfig> for GeminiGenerationConfig {
    fn from(config: GenerationConfig) -> Self {
        Self {
            temperature: config.temperature,
            top_k: config.top_k,
            top_p: config.top_p,
        }
    }
}

/// Split a conversation at its last user message.
///
/// Returns the messages before it (history) and the active turn. Anything
/// after the last user message, such as an empty assistant placeholder, is
/// not part of the request.
pub fn partition_turns(messages: &[Message]) -> Result<(&[Message], &Message), DomainError> {
    let active = messages
        .iter()
        .rposition(|m| m.role == MessageRole::User)
        .ok_or_else(|| DomainError::validation("Gemini request needs at least one user message"))?;

    Ok((&messages[..active], &messages[active]))
}

/// Map one message to a Gemini turn; `None` when it has no sendable parts
fn to_content(message: &Message) -> Option<GeminiContent> {
    let role = match message.role {
        MessageRole::User => "user",
        MessageRole::Assistant => "model",
        MessageRole::System | MessageRole::Tool => return None,
    };

    let parts: Vec<GeminiPart> = message
        .parts()
        .into_iter()
        .filter_map(|part| match part {
            ContentPart::Text { text } if text.is_empty() => None,
            ContentPart::Text { text } => Some(GeminiPart::Text { text }),
            ContentPart::ImageUrl { image_url } => {
                parse_data_uri(&image_url.url).map(|image| GeminiPart::InlineData {
                    inline_data: GeminiBlob {
                        mime_type: image.mime_type,
                        data: image.data,
                    },
                })
            }
        })
        .collect();

    if parts.is_empty() {
        return None;
    }

    Some(GeminiContent {
        role: Some(role),
        parts,
    })
}

/// Build the Gemini request: system text goes to `systemInstruction`, turns
/// without parts are dropped, and the last user message closes the list.
pub fn build_request(request: &ChatRequest) -> Result<GeminiRequest, DomainError> {
    let system_text = request
        .messages
        .iter()
        .filter(|m| m.role == MessageRole::System)
        .map(Message::text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    let (history, active) = partition_turns(&request.messages)?;

    let current = to_content(active).ok_or_else(|| {
        DomainError::validation("The latest user message has no text or decodable image")
    })?;

    let mut contents: Vec<GeminiContent> = history.iter().filter_map(to_content).collect();
    contents.push(current);

    let system_instruction = (!system_text.is_empty()).then(|| GeminiContent {
        role: None,
        parts: vec![GeminiPart::Text { text: system_text }],
    });

    let generation_config =
        (!request.generation.is_empty()).then(|| GeminiGenerationConfig::from(request.generation));

    Ok(GeminiRequest {
        contents,
        system_instruction,
        generation_config,
    })
}

/// Chat transport backed by a `GeminiClient`
#[derive(Debug)]
pub struct GeminiTransport<G: GeminiClient> {
    client: G,
}

impl<G: GeminiClient> GeminiTransport<G> {
    pub fn new(client: G) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<G: GeminiClient> ChatTransport for GeminiTransport<G> {
    async fn open_stream(&self, request: &ChatRequest) -> Result<EventStream, DomainError> {
        let gemini_request = build_request(request)?;

        tracing::debug!(
            model = %request.model,
            turns = gemini_request.contents.len(),
            "Opening Gemini content stream"
        );

        let texts = self
            .client
            .stream_generate_content(&request.model, &gemini_request)
            .await?;

        // No reasoning or usage is reported on this transport
        let events = texts.filter_map(|item| async move {
            match item {
                Ok(text) if text.is_empty() => None,
                Ok(text) => Some(Ok(TransportEvent::Chunk(StreamChunk::Content(text)))),
                Err(e) => Some(Err(e)),
            }
        });

        Ok(events.boxed())
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, DomainError> {
        let gemini_request = build_request(request)?;
        let text = self
            .client
            .generate_content(&request.model, &gemini_request)
            .await?;

        if text.is_empty() {
            return Err(DomainError::provider(PROVIDER, "No content in completion response"));
        }

        Ok(text)
    }

    fn protocol(&self) -> ProtocolType {
        ProtocolType::GoogleGemini
    }
}

/// `GeminiClient` over the Generative Language REST API
#[derive(Debug)]
pub struct HttpGeminiClient<C: HttpClientTrait> {
    client: C,
    base_url: String,
    api_key: String,
}

impl<C: HttpClientTrait> HttpGeminiClient<C> {
    pub fn new(client: C, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn stream_url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, model
        )
    }

    fn generate_url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("x-goog-api-key", self.api_key.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn to_body(request: &GeminiRequest) -> Result<serde_json::Value, DomainError> {
        serde_json::to_value(request)
            .map_err(|e| DomainError::internal(format!("Failed to encode Gemini request: {}", e)))
    }
}

#[async_trait]
impl<C: HttpClientTrait> GeminiClient for HttpGeminiClient<C> {
    async fn stream_generate_content(
        &self,
        model: &str,
        request: &GeminiRequest,
    ) -> Result<TextStream, DomainError> {
        let body = Self::to_body(request)?;
        let bytes = self
            .client
            .post_json_stream(&self.stream_url(model), self.headers(), &body)
            .await?;

        Ok(decode_lines(bytes, FrameFormat::Sse, decode_response_payload, |_| false))
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GeminiRequest,
    ) -> Result<String, DomainError> {
        let body = Self::to_body(request)?;
        let json = self
            .client
            .post_json(&self.generate_url(model), self.headers(), &body)
            .await?;

        let response: GeminiResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider(PROVIDER, format!("Failed to parse response: {}", e))
        })?;

        Ok(response.text())
    }
}

fn decode_response_payload(payload: &str) -> Result<Vec<String>, DomainError> {
    let response: GeminiResponse = match serde_json::from_str(payload) {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(provider = PROVIDER, error = %e, "Skipping malformed Gemini frame");
            return Ok(vec![]);
        }
    };

    if let Some(error) = response.error {
        return Err(DomainError::provider(
            PROVIDER,
            error.message.unwrap_or_else(|| "Unknown Gemini error".to_string()),
        ));
    }

    let text = response.text();
    Ok(if text.is_empty() { vec![] } else { vec![text] })
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    error: Option<GeminiError>,
}

impl GeminiResponse {
    /// Answer text of the first candidate; thought parts are not answer text
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter(|p| !p.thought)
                    .filter_map(|p| p.text.as_deref())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: Option<String>,
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use futures::stream;
    use std::sync::Mutex;

    /// Yields scripted chunks and records the last request
    #[derive(Debug, Default)]
    pub struct MockGeminiClient {
        chunks: Vec<String>,
        error: Option<String>,
        hang: bool,
        pub last_request: Mutex<Option<GeminiRequest>>,
    }

    impl MockGeminiClient {
        pub fn new(chunks: &[&str]) -> Self {
            Self {
                chunks: chunks.iter().map(|c| c.to_string()).collect(),
                ..Self::default()
            }
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        /// Keep the iterator open after the scripted chunks
        pub fn hang(mut self) -> Self {
            self.hang = true;
            self
        }
    }

    #[async_trait]
    impl GeminiClient for MockGeminiClient {
        async fn stream_generate_content(
            &self,
            _model: &str,
            request: &GeminiRequest,
        ) -> Result<TextStream, DomainError> {
            *self.last_request.lock().unwrap() = Some(request.clone());

            if let Some(ref error) = self.error {
                return Err(DomainError::provider("mock", error));
            }

            let chunks = stream::iter(self.chunks.clone().into_iter().map(Ok));
            if self.hang {
                Ok(chunks.chain(stream::pending()).boxed())
            } else {
                Ok(chunks.boxed())
            }
        }

        async fn generate_content(
            &self,
            _model: &str,
            request: &GeminiRequest,
        ) -> Result<String, DomainError> {
            *self.last_request.lock().unwrap() = Some(request.clone());

            match self.error {
                Some(ref error) => Err(DomainError::provider("mock", error)),
                None => Ok(self.chunks.concat()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockGeminiClient;
    use super::*;
    use crate::infrastructure::llm::http_client::mock::MockHttpClient;

    fn chat(messages: Vec<Message>) -> ChatRequest {
        ChatRequest::new("gemini-2.0-flash", messages)
    }

    #[test]
    fn test_partition_by_last_user_message() {
        let messages = vec![
            Message::user("first"),
            Message::assistant("reply"),
            Message::user("second"),
            Message::assistant(""),
        ];

        let (history, active) = partition_turns(&messages).unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(active.text(), "second");
    }

    #[test]
    fn test_partition_without_placeholder() {
        let messages = vec![Message::user("only")];
        let (history, active) = partition_turns(&messages).unwrap();

        assert!(history.is_empty());
        assert_eq!(active.text(), "only");
    }

    #[test]
    fn test_partition_requires_user_message() {
        assert!(partition_turns(&[Message::system("sys")]).is_err());
    }

    #[test]
    fn test_build_request_extracts_system_and_maps_roles() {
        let request = build_request(&chat(vec![
            Message::system("You are terse"),
            Message::user("Hi"),
            Message::assistant("Hello"),
            Message::user("Bye"),
        ]))
        .unwrap();

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "You are terse");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["contents"].as_array().unwrap().len(), 3);
        assert_eq!(json["contents"][1]["role"], "model");
        assert_eq!(json["contents"][2]["parts"][0]["text"], "Bye");
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn test_empty_turns_are_excluded() {
        let request = build_request(&chat(vec![
            Message::user(""),
            Message::assistant("ok"),
            Message::user_with_parts(vec![ContentPart::image("data:image/png;base64,%%%")]),
            Message::assistant(""),
            Message::user("real question"),
        ]))
        .unwrap();

        assert_eq!(request.contents.len(), 2);
        assert!(request.contents.iter().all(|c| !c.parts.is_empty()));
        assert_eq!(request.contents[0].role, Some("model"));
    }

    #[test]
    fn test_active_turn_without_parts_is_rejected() {
        let result = build_request(&chat(vec![Message::user("")]));
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[test]
    fn test_inline_image_and_generation_config() {
        let request = build_request(
            &chat(vec![Message::user_with_parts(vec![
                ContentPart::text("What's this?"),
                ContentPart::image("data:image/webp;base64,aGVsbG8="),
            ])])
            .with_generation(Some(GenerationConfig::new().top_k(32).top_p(0.95))),
        )
        .unwrap();

        let json = serde_json::to_value(&request).unwrap();
        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/webp");
        assert_eq!(parts[1]["inlineData"]["data"], "aGVsbG8=");
        assert_eq!(json["generationConfig"]["topK"], 32);
        assert!(json["generationConfig"].get("temperature").is_none());
    }

    #[tokio::test]
    async fn test_transport_streams_content_only() {
        let transport = GeminiTransport::new(MockGeminiClient::new(&["Hel", "", "lo"]));

        let events: Vec<TransportEvent> = transport
            .open_stream(&chat(vec![Message::user("Hi")]))
            .await
            .unwrap()
            .map(Result::unwrap)
            .collect()
            .await;

        assert_eq!(
            events,
            vec![
                TransportEvent::Chunk(StreamChunk::content("Hel")),
                TransportEvent::Chunk(StreamChunk::content("lo")),
            ]
        );
    }

    #[tokio::test]
    async fn test_transport_complete_empty_is_error() {
        let transport = GeminiTransport::new(MockGeminiClient::new(&[]));

        let result = transport.complete(&chat(vec![Message::user("Hi")])).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_http_client_decodes_sse() {
        let url = "https://gemini.test/v1beta/models/gemini-2.0-flash:streamGenerateContent?alt=sse";
        let http = MockHttpClient::new().with_stream_lines(
            url,
            &[
                "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"Hel\"}]}}]}\r\n\r\n",
                "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"plan\",\"thought\":true},{\"text\":\"lo\"}]}}],\"usageMetadata\":{\"promptTokenCount\":2}}\r\n\r\n",
            ],
        );
        let client = HttpGeminiClient::new(http, "https://gemini.test/v1beta/", "g-key");
        let request = build_request(&chat(vec![Message::user("Hi")])).unwrap();

        let texts: Vec<String> = client
            .stream_generate_content("gemini-2.0-flash", &request)
            .await
            .unwrap()
            .map(Result::unwrap)
            .collect()
            .await;

        assert_eq!(texts, vec!["Hel".to_string(), "lo".to_string()]);

        let recorded = client.client.requests();
        assert!(
            recorded[0]
                .headers
                .contains(&("x-goog-api-key".to_string(), "g-key".to_string()))
        );
    }

    #[tokio::test]
    async fn test_http_client_generate_content() {
        let url = "https://gemini.test/v1beta/models/gemini-2.0-flash:generateContent";
        let http = MockHttpClient::new().with_response(
            url,
            serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "Trip "}, {"text": "ideas"}]}}]
            }),
        );
        let client = HttpGeminiClient::new(http, "https://gemini.test/v1beta", "g-key");
        let request = build_request(&chat(vec![Message::user("Hi")])).unwrap();

        let text = client.generate_content("gemini-2.0-flash", &request).await.unwrap();
        assert_eq!(text, "Trip ideas");
    }
}
