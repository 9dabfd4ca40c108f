//! Model service - model listings and Ollama model details

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::domain::{
    api_root, CredentialMap, DomainError, Model, ModelDetails, ProtocolType, ProviderConfig,
};
use crate::infrastructure::llm::{HttpClientTrait, GEMINI_MODELS};

static NUM_CTX: Lazy<Regex> = Lazy::new(|| Regex::new(r"num_ctx\s+(\d+)").expect("valid regex"));

/// Model catalogue queries against provider endpoints
#[derive(Debug)]
pub struct ModelService<C: HttpClientTrait> {
    client: C,
}

impl<C: HttpClientTrait> ModelService<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// List the models a provider serves.
    ///
    /// Both `{data: [...]}` and Ollama's `{models: [...]}` listings are
    /// normalized to `Model`. Gemini has a fixed catalogue.
    pub async fn fetch_models(
        &self,
        provider: &ProviderConfig,
        credentials: &CredentialMap,
    ) -> Result<Vec<Model>, DomainError> {
        let credential = credentials.resolve(provider)?;

        let url = match provider.protocol_type() {
            ProtocolType::GoogleGemini => {
                return Ok(GEMINI_MODELS
                    .iter()
                    .map(|id| Model::new(*id, 0, "google"))
                    .collect());
            }
            ProtocolType::OpenAiCompatible => {
                format!("{}/models", Self::required_base_url(provider)?)
            }
            ProtocolType::Ollama => {
                format!("{}/api/tags", api_root(Self::required_base_url(provider)?))
            }
        };

        let auth = credential.map(|key| format!("Bearer {}", key));
        let mut headers = Vec::new();
        if let Some(ref auth) = auth {
            headers.push(("Authorization", auth.as_str()));
        }

        tracing::debug!(provider = %provider.id(), url = %url, "Fetching models");

        let json = self.client.get_json(&url, headers).await?;
        let listing: ModelListing = serde_json::from_value(json).map_err(|e| {
            DomainError::provider(provider.id(), format!("Failed to parse model list: {}", e))
        })?;

        let models = listing.into_models().ok_or_else(|| {
            DomainError::provider(provider.id(), "Model list response has no 'data' or 'models'")
        })?;

        tracing::info!(provider = %provider.id(), count = models.len(), "Fetched models");
        Ok(models)
    }

    /// Read model details from Ollama's `/api/show`
    pub async fn fetch_ollama_model_details(
        &self,
        base_url: &str,
        model_name: &str,
    ) -> Result<ModelDetails, DomainError> {
        if base_url.trim().is_empty() {
            return Err(DomainError::configuration("Ollama base URL must not be empty"));
        }

        if model_name.trim().is_empty() {
            return Err(DomainError::validation("Model name must not be empty"));
        }

        let url = format!("{}/api/show", api_root(base_url));
        let body = serde_json::json!({ "name": model_name });

        let json = self
            .client
            .post_json(&url, vec![("Content-Type", "application/json")], &body)
            .await?;

        let show: ShowResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider("ollama", format!("Failed to parse model details: {}", e))
        })?;

        let context_length = show.parameters.as_deref().and_then(parse_num_ctx);
        let details = show.details.unwrap_or_default();

        Ok(ModelDetails {
            context_length,
            parameters: show.parameters,
            family: details.family,
            parameter_size: details.parameter_size,
            quantization_level: details.quantization_level,
        })
    }

    fn required_base_url(provider: &ProviderConfig) -> Result<&str, DomainError> {
        let base_url = provider.base_url();
        if base_url.trim().is_empty() {
            return Err(DomainError::configuration(format!(
                "Provider '{}' has no base URL",
                provider.id()
            )));
        }
        Ok(base_url)
    }
}

/// Extract `num_ctx` from a modelfile parameters block
pub fn parse_num_ctx(parameters: &str) -> Option<u32> {
    NUM_CTX
        .captures(parameters)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn unix_seconds(modified_at: Option<&str>) -> i64 {
    modified_at
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.timestamp())
        .unwrap_or_else(|| Utc::now().timestamp())
}

#[derive(Debug, Deserialize)]
struct ModelListing {
    data: Option<Vec<Model>>,
    models: Option<Vec<OllamaTag>>,
}

impl ModelListing {
    fn into_models(self) -> Option<Vec<Model>> {
        if let Some(data) = self.data {
            return Some(data);
        }

        self.models.map(|tags| {
            tags.into_iter()
                .map(|tag| {
                    let created = unix_seconds(tag.modified_at.as_deref());
                    Model::new(tag.name, created, "ollama")
                })
                .collect()
        })
    }
}

#[derive(Debug, Deserialize)]
struct OllamaTag {
    name: String,
    modified_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ShowResponse {
    parameters: Option<String>,
    details: Option<ShowDetails>,
}

#[derive(Debug, Default, Deserialize)]
struct ShowDetails {
    family: Option<String>,
    parameter_size: Option<String>,
    quantization_level: Option<String>,
}
