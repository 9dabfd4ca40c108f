use super::ProviderConfig;
use crate::domain::DomainError;

const DEFAULT_GEMINI_CREDENTIAL_KEY: &str = "GEMINI_API_KEY";

/// Read-only lookup table of configured providers, in registration order
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<ProviderConfig>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the local servers and Gemini
    pub fn with_defaults() -> Self {
        Self::new()
            .with_provider(ProviderConfig::openai_compatible(
                "ollama",
                "Ollama",
                "http://localhost:11434/v1",
            ))
            .with_provider(ProviderConfig::openai_compatible(
                "lmstudio",
                "LM Studio",
                "http://localhost:1234/v1",
            ))
            .with_provider(ProviderConfig::gemini(DEFAULT_GEMINI_CREDENTIAL_KEY))
    }

    pub fn with_provider(mut self, provider: ProviderConfig) -> Self {
        self.register(provider);
        self
    }

    /// Add a provider, replacing any existing one with the same id
    pub fn register(&mut self, provider: ProviderConfig) {
        match self.providers.iter_mut().find(|p| p.id() == provider.id()) {
            Some(existing) => *existing = provider,
            None => self.providers.push(provider),
        }
    }

    pub fn get(&self, id: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.id() == id)
    }

    pub fn get_required(&self, id: &str) -> Result<&ProviderConfig, DomainError> {
        self.get(id)
            .ok_or_else(|| DomainError::not_found(format!("Provider '{}' not found", id)))
    }

    pub fn list(&self) -> &[ProviderConfig] {
        &self.providers
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
