use serde::{Deserialize, Serialize};

pub const GEMINI_PROVIDER_ID: &str = "google-gemini";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Wire protocol spoken by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProtocolType {
    /// `/chat/completions` with SSE streaming (OpenAI, LM Studio, Ollama `/v1`)
    #[serde(rename = "openai-compatible")]
    OpenAiCompatible,
    /// Ollama native `/api/chat` with NDJSON streaming
    Ollama,
    GoogleGemini,
}

impl ProtocolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolType::OpenAiCompatible => "openai-compatible",
            ProtocolType::Ollama => "ollama",
            ProtocolType::GoogleGemini => "google-gemini",
        }
    }
}

impl std::fmt::Display for ProtocolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configured model-serving backend. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    id: String,
    display_name: String,
    #[serde(default)]
    base_url: String,
    protocol_type: ProtocolType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    credential_key: Option<String>,
    #[serde(default)]
    is_user_defined: bool,
}

impl ProviderConfig {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        base_url: impl Into<String>,
        protocol_type: ProtocolType,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            protocol_type,
            credential_key: None,
            is_user_defined: false,
        }
    }

    pub fn openai_compatible(
        id: impl Into<String>,
        display_name: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self::new(id, display_name, base_url, ProtocolType::OpenAiCompatible)
    }

    pub fn ollama(id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self::new(id, "Ollama", base_url, ProtocolType::Ollama)
    }

    /// The Gemini pseudo-provider; its credential is looked up under `credential_key`
    pub fn gemini(credential_key: impl Into<String>) -> Self {
        Self::new(
            GEMINI_PROVIDER_ID,
            "Google Gemini",
            DEFAULT_GEMINI_BASE_URL,
            ProtocolType::GoogleGemini,
        )
        .with_credential_key(credential_key)
    }

    pub fn with_credential_key(mut self, key: impl Into<String>) -> Self {
        self.credential_key = Some(key.into());
        self
    }

    pub fn with_user_defined(mut self, user_defined: bool) -> Self {
        self.is_user_defined = user_defined;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn protocol_type(&self) -> ProtocolType {
        self.protocol_type
    }

    pub fn credential_key(&self) -> Option<&str> {
        self.credential_key.as_deref()
    }

    pub fn is_user_defined(&self) -> bool {
        self.is_user_defined
    }

    /// Base URL with a trailing `/v1` removed, used for Ollama's native `/api/*` routes
    pub fn api_root(&self) -> &str {
        api_root(&self.base_url)
    }
}

/// Strip a trailing `/v1` (and slashes) from a base URL
pub fn api_root(base_url: &str) -> &str {
    let trimmed = base_url.trim_end_matches('/');
    trimmed.strip_suffix("/v1").unwrap_or(trimmed)
}
