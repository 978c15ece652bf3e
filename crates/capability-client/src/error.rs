//! Error types for capability-client

use thiserror::Error;

use capability_core::RouterError;

/// Client error types
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to connect: {0}")]
    Transport(String),

    #[error("Already connected to a server")]
    AlreadyConnected,

    #[error("Not connected to a server")]
    NotConnected,

    #[error("{0}")]
    Remote(#[from] RouterError),

    #[error("Invalid JSON arguments: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Server connection lost")]
    ConnectionLost,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Whether the server answered that it does not implement the method
    pub fn is_method_not_found(&self) -> bool {
        matches!(self, ClientError::Remote(err) if err.is_method_not_found())
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_not_found_detection() {
        let err = ClientError::from(RouterError::MethodNotFound("resources/list".to_string()));
        assert!(err.is_method_not_found());

        let err = ClientError::from(RouterError::Internal("boom".to_string()));
        assert!(!err.is_method_not_found());
        assert!(!ClientError::NotConnected.is_method_not_found());
    }

    #[test]
    fn test_remote_display_keeps_kind() {
        let err = ClientError::from(RouterError::InvalidParams(
            "Missing required argument: b".to_string(),
        ));
        assert_eq!(err.to_string(), "Invalid params: Missing required argument: b");
    }
}
