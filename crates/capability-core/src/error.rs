//! Error types for capability-core

use thiserror::Error;

use crate::namespace::Namespace;
use crate::protocol::McpError;

/// Registry error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Duplicate {} name: {name}", namespace.singular())]
    DuplicateName { namespace: Namespace, name: String },

    #[error("Unknown {}: {name}", namespace.singular())]
    NotFound { namespace: Namespace, name: String },
}

/// Router error types.
///
/// Each variant maps onto one JSON-RPC error code so callers can tell an
/// unsupported capability apart from a failing one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RouterError {
    /// JSON-RPC error code for this error
    pub fn code(&self) -> i32 {
        match self {
            RouterError::MethodNotFound(_) => McpError::METHOD_NOT_FOUND,
            RouterError::InvalidParams(_) => McpError::INVALID_PARAMS,
            RouterError::Internal(_) => McpError::INTERNAL_ERROR,
        }
    }

    /// Message without the variant prefix
    pub fn message(&self) -> &str {
        match self {
            RouterError::MethodNotFound(m) | RouterError::InvalidParams(m) | RouterError::Internal(m) => m,
        }
    }

    pub fn is_method_not_found(&self) -> bool {
        matches!(self, RouterError::MethodNotFound(_))
    }
}

impl From<RegistryError> for RouterError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound { .. } => RouterError::MethodNotFound(err.to_string()),
            RegistryError::DuplicateName { .. } => RouterError::Internal(err.to_string()),
        }
    }
}

impl From<RouterError> for McpError {
    fn from(err: RouterError) -> Self {
        McpError::new(err.code(), err.message())
    }
}

impl From<McpError> for RouterError {
    fn from(err: McpError) -> Self {
        match err.code {
            McpError::METHOD_NOT_FOUND => RouterError::MethodNotFound(err.message),
            McpError::INVALID_PARAMS => RouterError::InvalidParams(err.message),
            _ => RouterError::Internal(err.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_method_not_found() {
        let err = RegistryError::NotFound {
            namespace: Namespace::Tools,
            name: "nope".to_string(),
        };
        let routed = RouterError::from(err);

        assert!(routed.is_method_not_found());
        assert_eq!(routed.message(), "Unknown tool: nope");
        assert_eq!(routed.code(), -32601);
    }

    #[test]
    fn test_wire_round_trip_keeps_kind() {
        let original = RouterError::InvalidParams("Missing required argument: b".to_string());
        let wire = McpError::from(original.clone());

        assert_eq!(wire.code, -32602);
        assert_eq!(RouterError::from(wire), original);
    }

    #[test]
    fn test_unknown_codes_become_internal() {
        let err = RouterError::from(McpError::new(-32000, "server exploded"));
        assert_eq!(err, RouterError::Internal("server exploded".to_string()));
    }
}
