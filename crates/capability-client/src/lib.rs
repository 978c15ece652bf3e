//! # capability-client
//!
//! Interactive client for capability servers:
//! - [`transport`]: spawns a server and speaks newline-delimited JSON-RPC to it
//! - [`Session`]: handshake, cached descriptors and typed invocations
//! - [`InteractiveLoop`]: the `mcp> ` command loop
//! - [`ShutdownCoordinator`]: one teardown for `exit`, end of input and signals

pub mod command;
mod error;
pub mod interactive;
pub mod render;
pub mod session;
pub mod shutdown;
pub mod transport;

use std::time::Duration;

pub use command::Command;
pub use error::{ClientError, Result};
pub use interactive::{InteractiveLoop, Mode, PendingCommand};
pub use session::{RemoteCapabilities, Session};
pub use shutdown::{ShutdownCoordinator, ShutdownReason};
pub use transport::{Connection, ConnectionEvent, Connector, EndpointSpec, StdioConnector};

/// Default time a single request may take before it fails
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client configuration, built once from the command line
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: EndpointSpec,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(endpoint: EndpointSpec) -> Self {
        Self {
            endpoint,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Connector matching this configuration
    pub fn connector(&self) -> StdioConnector {
        StdioConnector::new(self.request_timeout)
    }
}
