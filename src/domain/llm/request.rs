use serde::{Deserialize, Serialize};

use super::Message;

/// Sampling parameters, mapped to each provider's field names by the transport
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

impl GenerationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.top_k.is_none() && self.top_p.is_none()
    }
}

/// A chat request as handed to a transport
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub generation: GenerationConfig,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            generation: GenerationConfig::default(),
        }
    }

    pub fn with_generation(mut self, generation: Option<GenerationConfig>) -> Self {
        self.generation = generation.unwrap_or_default();
        self
    }
}
