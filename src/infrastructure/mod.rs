//! Infrastructure layer - HTTP transports, services and logging

pub mod llm;
pub mod logging;
pub mod services;
