use serde::{Deserialize, Serialize};

/// Normalized unit of streamed output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "text", rename_all = "snake_case")]
pub enum StreamChunk {
    Content(String),
    Reasoning(String),
}

impl StreamChunk {
    pub fn content(text: impl Into<String>) -> Self {
        Self::Content(text.into())
    }

    pub fn reasoning(text: impl Into<String>) -> Self {
        Self::Reasoning(text.into())
    }

    pub fn text(&self) -> &str {
        match self {
            StreamChunk::Content(text) | StreamChunk::Reasoning(text) => text,
        }
    }

    pub fn is_content(&self) -> bool {
        matches!(self, StreamChunk::Content(_))
    }
}

/// Token usage statistics; every field is optional because providers report subsets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u32>,
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens: Some(prompt_tokens),
            completion_tokens: Some(completion_tokens),
            total_tokens: Some(prompt_tokens.saturating_add(completion_tokens)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.prompt_tokens.is_none() && self.completion_tokens.is_none() && self.total_tokens.is_none()
    }

    /// Overlay `other` on top of `self`; fields `other` reports win
    pub fn merge(self, other: Usage) -> Usage {
        Usage {
            prompt_tokens: other.prompt_tokens.or(self.prompt_tokens),
            completion_tokens: other.completion_tokens.or(self.completion_tokens),
            total_tokens: other.total_tokens.or(self.total_tokens),
        }
    }
}

/// Terminal payload delivered with `on_done`.
///
/// The empty value (all `None`) is what a cancelled stream reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    /// Completion tokens per second
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// All reasoning chunks, concatenated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
}

impl CompletionMetadata {
    pub fn is_empty(&self) -> bool {
        self.usage.is_none() && self.speed.is_none() && self.thinking.is_none()
    }
}
