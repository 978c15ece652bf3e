//! Error types for capability-server

use thiserror::Error;

use capability_core::RegistryError;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Capability registration failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} - {body}")]
    Upstream { status: u16, body: String },
}
