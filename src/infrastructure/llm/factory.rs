use std::sync::Arc;

use super::gemini::{GeminiTransport, HttpGeminiClient};
use super::http_client::HttpClient;
use super::ollama::OllamaTransport;
use super::openai_compatible::OpenAiCompatibleTransport;
use crate::domain::provider::DEFAULT_GEMINI_BASE_URL;
use crate::domain::{ChatTransport, DomainError, ProtocolType, ProviderConfig};

/// Factory for creating chat transports
#[derive(Debug)]
pub struct TransportFactory;

impl TransportFactory {
    /// Create the transport for a provider's protocol
    pub fn create(
        provider: &ProviderConfig,
        credential: Option<&str>,
        http_client: HttpClient,
    ) -> Result<Arc<dyn ChatTransport>, DomainError> {
        match provider.protocol_type() {
            ProtocolType::OpenAiCompatible => {
                Self::validate_base_url(provider)?;
                let transport =
                    OpenAiCompatibleTransport::new(http_client, provider.base_url(), credential);
                Ok(Arc::new(transport))
            }

            ProtocolType::Ollama => {
                Self::validate_base_url(provider)?;
                let transport = OllamaTransport::new(http_client, provider.base_url());
                Ok(Arc::new(transport))
            }

            ProtocolType::GoogleGemini => {
                let api_key = credential.filter(|key| !key.is_empty()).ok_or_else(|| {
                    DomainError::credential(format!(
                        "Provider '{}' requires an API key",
                        provider.id()
                    ))
                })?;

                let client =
                    HttpGeminiClient::new(http_client, Self::gemini_base_url(provider), api_key);
                Ok(Arc::new(GeminiTransport::new(client)))
            }
        }
    }

    /// Gemini needs no configured base URL; the public endpoint is the default
    fn gemini_base_url(provider: &ProviderConfig) -> &str {
        match provider.base_url().trim() {
            "" => DEFAULT_GEMINI_BASE_URL,
            base_url => base_url,
        }
    }

    fn validate_base_url(provider: &ProviderConfig) -> Result<(), DomainError> {
        if provider.base_url().trim().is_empty() {
            return Err(DomainError::configuration(format!(
                "Provider '{}' has no base URL",
                provider.id()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_openai_compatible_transport() {
        let provider =
            ProviderConfig::openai_compatible("lmstudio", "LM Studio", "http://localhost:1234/v1");

        let transport = TransportFactory::create(&provider, None, HttpClient::new()).unwrap();
        assert_eq!(transport.protocol(), ProtocolType::OpenAiCompatible);
    }

    #[test]
    fn test_create_ollama_transport() {
        let provider = ProviderConfig::ollama("ollama-native", "http://localhost:11434");

        let transport = TransportFactory::create(&provider, None, HttpClient::new()).unwrap();
        assert_eq!(transport.protocol(), ProtocolType::Ollama);
    }

    #[test]
    fn test_create_gemini_transport() {
        let provider = ProviderConfig::gemini("GEMINI_API_KEY");

        let transport =
            TransportFactory::create(&provider, Some("g-key"), HttpClient::new()).unwrap();
        assert_eq!(transport.protocol(), ProtocolType::GoogleGemini);
    }

    #[test]
    fn test_gemini_without_key_is_rejected() {
        let provider = ProviderConfig::gemini("GEMINI_API_KEY");

        let result = TransportFactory::create(&provider, None, HttpClient::new());
        assert!(matches!(result, Err(DomainError::Credential { .. })));
    }

    #[test]
    fn test_gemini_without_base_url_uses_public_endpoint() {
        let provider: ProviderConfig = serde_json::from_value(serde_json::json!({
            "id": "google-gemini",
            "display_name": "Gemini",
            "protocol_type": "google-gemini",
            "credential_key": "GEMINI_API_KEY"
        }))
        .unwrap();

        assert_eq!(provider.base_url(), "");
        assert_eq!(
            TransportFactory::gemini_base_url(&provider),
            DEFAULT_GEMINI_BASE_URL
        );

        let transport =
            TransportFactory::create(&provider, Some("g-key"), HttpClient::new()).unwrap();
        assert_eq!(transport.protocol(), ProtocolType::GoogleGemini);
    }

    #[test]
    fn test_gemini_keeps_configured_base_url() {
        let provider = ProviderConfig::new(
            "gemini-proxy",
            "Gemini via proxy",
            "https://proxy.internal/v1beta",
            ProtocolType::GoogleGemini,
        );

        assert_eq!(
            TransportFactory::gemini_base_url(&provider),
            "https://proxy.internal/v1beta"
        );
    }

    #[test]
    fn test_empty_base_url_is_configuration_error() {
        let provider = ProviderConfig::openai_compatible("custom", "Custom", "");

        let result = TransportFactory::create(&provider, None, HttpClient::new());
        assert!(result.unwrap_err().to_string().contains("no base URL"));
    }
}
