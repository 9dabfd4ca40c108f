//! Provider configuration, lookup and credentials

mod config;
mod credentials;
mod registry;

pub use config::{api_root, ProtocolType, ProviderConfig, DEFAULT_GEMINI_BASE_URL, GEMINI_PROVIDER_ID};
pub use credentials::CredentialMap;
pub use registry::ProviderRegistry;
