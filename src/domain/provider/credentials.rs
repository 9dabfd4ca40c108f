use std::collections::HashMap;
use std::env;

use super::{ProtocolType, ProviderConfig};
use crate::domain::DomainError;

/// Snapshot of credential secrets keyed by credential key
#[derive(Clone, Default)]
pub struct CredentialMap {
    secrets: HashMap<String, String>,
}

impl CredentialMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, key: impl Into<String>, secret: impl Into<String>) -> Self {
        self.insert(key, secret);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, secret: impl Into<String>) {
        self.secrets.insert(key.into(), secret.into());
    }

    /// Read each key from the environment, skipping unset or empty variables
    pub fn from_env<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        let mut map = Self::new();

        for key in keys {
            match env::var(key) {
                Ok(value) if !value.is_empty() => map.insert(key, value),
                _ => tracing::debug!(key = %key, "Credential not present in environment"),
            }
        }

        map
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.secrets.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    /// Resolve the secret a provider needs.
    ///
    /// Returns `Ok(None)` for providers that declare no credential key (local
    /// servers), and a credential error when a declared key is absent. Gemini
    /// always needs a key.
    pub fn resolve(&self, provider: &ProviderConfig) -> Result<Option<&str>, DomainError> {
        match provider.credential_key() {
            Some(key) => self.get(key).map(Some).ok_or_else(|| {
                DomainError::credential(format!(
                    "Missing credential '{}' for provider '{}'",
                    key,
                    provider.id()
                ))
            }),
            None if provider.protocol_type() == ProtocolType::GoogleGemini => {
                Err(DomainError::credential(format!(
                    "Provider '{}' requires an API key but declares no credential key",
                    provider.id()
                )))
            }
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for CredentialMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialMap")
            .field("keys", &self.secrets.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CredentialMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            secrets: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_without_credential_key() {
        let provider = ProviderConfig::openai_compatible("ollama", "Ollama", "http://localhost:11434/v1");
        let credentials = CredentialMap::new();

        assert_eq!(credentials.resolve(&provider).unwrap(), None);
    }

    #[test]
    fn test_resolve_present_key() {
        let provider = ProviderConfig::openai_compatible("openai", "OpenAI", "https://api.openai.com/v1")
            .with_credential_key("OPENAI_API_KEY");
        let credentials = CredentialMap::new().with_secret("OPENAI_API_KEY", "sk-test");

        assert_eq!(credentials.resolve(&provider).unwrap(), Some("sk-test"));
    }

    #[test]
    fn test_resolve_missing_key_is_configuration_error() {
        let provider = ProviderConfig::gemini("GEMINI_API_KEY");
        let err = CredentialMap::new().resolve(&provider).unwrap_err();

        assert!(err.is_configuration());
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_debug_does_not_leak_secrets() {
        let credentials: CredentialMap = [("KEY", "super-secret")].into_iter().collect();
        let debug = format!("{:?}", credentials);

        assert!(debug.contains("KEY"));
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn test_from_env_skips_unset() {
        let credentials = CredentialMap::from_env(["LLM_STREAM_ADAPTER_SURELY_UNSET_VAR"]);
        assert!(credentials.is_empty());
    }
}
