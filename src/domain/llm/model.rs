use serde::{Deserialize, Serialize};

/// A model as listed by a provider, in OpenAI `/models` shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    #[serde(default = "default_object")]
    pub object: String,
    /// Unix seconds
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub owned_by: String,
}

fn default_object() -> String {
    "model".to_string()
}

impl Model {
    pub fn new(id: impl Into<String>, created: i64, owned_by: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            object: default_object(),
            created,
            owned_by: owned_by.into(),
        }
    }
}

/// Details reported by Ollama's `/api/show`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDetails {
    /// `num_ctx` from the modelfile parameters
    pub context_length: Option<u32>,
    pub parameters: Option<String>,
    pub family: Option<String>,
    pub parameter_size: Option<String>,
    pub quantization_level: Option<String>,
}
