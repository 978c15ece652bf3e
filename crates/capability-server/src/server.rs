//! Main capability server orchestration

use std::sync::Arc;
use tracing::info;

use crate::handler::RequestHandler;
use crate::transport::{HttpTransport, StdioTransport};
use crate::ServerError;
use capability_core::protocol::ServerInfo;
use capability_core::{CapabilityRegistry, RequestRouter};

/// Server mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerMode {
    /// stdio transport (spawned by a client)
    #[default]
    Stdio,
    /// HTTP transport
    Http { port: u16 },
}

/// Capability server: a registry exposed over one transport
pub struct CapabilityServer {
    handler: Arc<RequestHandler>,
    mode: ServerMode,
}

impl CapabilityServer {
    /// Create a new server over a finished registry
    pub fn new(registry: CapabilityRegistry, server_info: ServerInfo) -> Self {
        let router = RequestRouter::new(Arc::new(registry));
        Self {
            handler: Arc::new(RequestHandler::new(router, server_info)),
            mode: ServerMode::default(),
        }
    }

    /// Set the server mode
    pub fn with_mode(mut self, mode: ServerMode) -> Self {
        self.mode = mode;
        self
    }

    /// Run the server
    pub async fn run(&self) -> Result<(), ServerError> {
        match self.mode {
            ServerMode::Stdio => {
                info!("Starting capability server in stdio mode");
                StdioTransport::new(self.handler.clone()).run().await
            }
            ServerMode::Http { port } => {
                info!("Starting capability server in HTTP mode on port {}", port);
                HttpTransport::new(self.handler.clone(), port).run().await
            }
        }
    }
}
