use serde::Deserialize;
use std::time::Duration;

use crate::domain::{CredentialMap, ProviderConfig, ProviderRegistry};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    /// Added to the built-in providers; an entry with a built-in id replaces it
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamConfig {
    /// Seconds without a stream event before the call fails; unset disables it
    #[serde(default)]
    pub idle_timeout_secs: Option<u64>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
        }
    }
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl StreamConfig {
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Built-in providers merged with the configured ones
    pub fn registry(&self) -> ProviderRegistry {
        self.providers
            .iter()
            .cloned()
            .fold(ProviderRegistry::with_defaults(), ProviderRegistry::with_provider)
    }

    /// Secrets for every credential key the registry declares, read from the environment
    pub fn credentials(&self, registry: &ProviderRegistry) -> CredentialMap {
        CredentialMap::from_env(registry.list().iter().filter_map(ProviderConfig::credential_key))
    }
}
