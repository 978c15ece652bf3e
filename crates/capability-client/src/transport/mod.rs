//! Transport layer for talking to capability servers
//!
//! A [`Connector`] opens a [`Connection`] to an endpoint. The connection
//! carries JSON-RPC requests and notifications; protocol meaning (initialize,
//! listings, invocations) lives in [`crate::session`].

mod stdio;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::Result;

pub use stdio::{StdioConnection, StdioConnector};

/// How to reach a capability server
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointSpec {
    /// Program to spawn
    pub command: String,
    /// Arguments passed to the program
    pub args: Vec<String>,
    /// Extra environment variables for the spawned server
    pub env: BTreeMap<String, String>,
}

impl EndpointSpec {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            env: BTreeMap::new(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

impl std::fmt::Display for EndpointSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.command)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Something that happened to a connection without the client asking
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The server went away
    Closed,
    /// The transport hit an error it could not attribute to a request
    Error(String),
}

/// An open connection to a capability server
#[async_trait]
pub trait Connection: Send + Sync {
    /// Send a request and wait for its response
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value>;

    /// Send a notification (no response expected)
    async fn notify(&self, method: &str, params: Option<Value>) -> Result<()>;

    /// Close the connection. Closing an already closed connection is a no-op.
    async fn close(&self) -> Result<()>;

    /// Take the stream of unsolicited connection events. Only the first
    /// caller gets the receiver.
    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<ConnectionEvent>>;
}

/// Opens connections to endpoints
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, endpoint: &EndpointSpec) -> Result<Arc<dyn Connection>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_display() {
        let endpoint = EndpointSpec::new("capability-server", vec!["weather".to_string()])
            .with_env("OPENWEATHER_API_KEY", "secret");

        assert_eq!(endpoint.to_string(), "capability-server weather");
        assert_eq!(endpoint.env.get("OPENWEATHER_API_KEY").map(String::as_str), Some("secret"));
    }
}
