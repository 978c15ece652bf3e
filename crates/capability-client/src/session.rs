//! Client session: one connection to one capability server
//!
//! The session owns the connection, performs the initialize handshake, keeps
//! the server's descriptors cached and forwards remote close/error events to
//! registered observers.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{ClientError, Result};
use crate::transport::{Connection, ConnectionEvent, Connector, EndpointSpec};
use capability_core::protocol::{
    ClientCapabilities, ClientInfo, GetPromptParams, GetPromptResult, InitializeParams,
    InitializeResult, McpPrompt, McpResource, McpTool, PromptsListResult, ReadResourceParams,
    ReadResourceResult, ResourcesListResult, ServerInfo, ToolCallParams, ToolCallResult,
    ToolsListResult, MCP_VERSION,
};
use capability_core::{Method, Namespace, ServerCapabilities};

/// What the connected server told us about itself
#[derive(Debug, Clone)]
pub struct RemoteCapabilities {
    pub server_info: ServerInfo,
    pub capabilities: ServerCapabilities,
    /// `None` when the server does not support the listing
    pub tools: Option<Vec<McpTool>>,
    pub resources: Option<Vec<McpResource>>,
    pub prompts: Option<Vec<McpPrompt>>,
}

impl RemoteCapabilities {
    /// Cached descriptor of a tool, if the server listed it
    pub fn tool(&self, name: &str) -> Option<&McpTool> {
        self.tools.as_ref()?.iter().find(|tool| tool.name == name)
    }

    /// Cached descriptor of a prompt, if the server listed it
    pub fn prompt(&self, name: &str) -> Option<&McpPrompt> {
        self.prompts.as_ref()?.iter().find(|prompt| prompt.name == name)
    }
}

type CloseObserver = Box<dyn Fn() + Send + Sync>;
type ErrorObserver = Box<dyn Fn(&str) + Send + Sync>;

#[derive(Default)]
struct Observers {
    close: RwLock<Vec<CloseObserver>>,
    error: RwLock<Vec<ErrorObserver>>,
}

impl Observers {
    fn dispatch(&self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Closed => {
                if let Ok(observers) = self.close.read() {
                    observers.iter().for_each(|observer| observer());
                }
            }
            ConnectionEvent::Error(message) => {
                if let Ok(observers) = self.error.read() {
                    observers.iter().for_each(|observer| observer(&message));
                }
            }
        }
    }
}

/// A session with a capability server
pub struct Session {
    connector: Arc<dyn Connector>,
    client_info: ClientInfo,
    connection: Option<Arc<dyn Connection>>,
    remote: Option<RemoteCapabilities>,
    observers: Arc<Observers>,
    events: Option<JoinHandle<()>>,
}

impl Session {
    /// Create a disconnected session
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            client_info: ClientInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            connection: None,
            remote: None,
            observers: Arc::new(Observers::default()),
            events: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Server identity and cached descriptors of the live connection
    pub fn remote(&self) -> Option<&RemoteCapabilities> {
        self.remote.as_ref()
    }

    /// Register a callback for the server closing the connection
    pub fn on_remote_close<F>(&self, observer: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        if let Ok(mut observers) = self.observers.close.write() {
            observers.push(Box::new(observer));
        }
    }

    /// Register a callback for transport errors not tied to a request
    pub fn on_remote_error<F>(&self, observer: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        if let Ok(mut observers) = self.observers.error.write() {
            observers.push(Box::new(observer));
        }
    }

    /// Connect to a server, run the handshake and cache its descriptors
    pub async fn connect(&mut self, endpoint: &EndpointSpec) -> Result<&RemoteCapabilities> {
        if self.connection.is_some() {
            return Err(ClientError::AlreadyConnected);
        }

        let connection = self.connector.connect(endpoint).await?;

        let initialized = match self.handshake(connection.as_ref()).await {
            Ok(initialized) => initialized,
            Err(e) => {
                let _ = connection.close().await;
                return Err(match e {
                    ClientError::Transport(_) => e,
                    other => ClientError::Transport(format!("handshake failed: {}", other)),
                });
            }
        };

        info!(
            "Connected to {} v{}",
            initialized.server_info.name, initialized.server_info.version
        );

        if let Some(mut events) = connection.take_events() {
            let observers = self.observers.clone();
            self.events = Some(tokio::spawn(async move {
                while let Some(event) = events.recv().await {
                    debug!("Connection event: {:?}", event);
                    observers.dispatch(event);
                }
            }));
        }

        let tools = fetch::<ToolsListResult>(connection.as_ref(), Namespace::Tools)
            .await
            .map(|r| r.tools);
        let resources = fetch::<ResourcesListResult>(connection.as_ref(), Namespace::Resources)
            .await
            .map(|r| r.resources);
        let prompts = fetch::<PromptsListResult>(connection.as_ref(), Namespace::Prompts)
            .await
            .map(|r| r.prompts);

        self.connection = Some(connection);
        Ok(self.remote.insert(RemoteCapabilities {
            server_info: initialized.server_info,
            capabilities: initialized.capabilities,
            tools,
            resources,
            prompts,
        }))
    }

    async fn handshake(&self, connection: &dyn Connection) -> Result<InitializeResult> {
        let params = InitializeParams {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ClientCapabilities::default(),
            client_info: self.client_info.clone(),
        };

        let result = connection
            .request(Method::Initialize.as_str(), Some(serde_json::to_value(params)?))
            .await?;
        let initialized: InitializeResult = serde_json::from_value(result)?;

        connection.notify("notifications/initialized", None).await?;
        Ok(initialized)
    }

    /// Close the connection. Disconnecting twice is a no-op.
    pub async fn disconnect(&mut self) -> Result<()> {
        let Some(connection) = self.connection.take() else {
            return Ok(());
        };

        self.remote = None;
        let closed = connection.close().await;
        if let Some(events) = self.events.take() {
            events.abort();
        }

        info!("Disconnected");
        closed
    }

    /// Send a raw request over the live connection
    pub async fn invoke(&self, method: Method, params: Option<Value>) -> Result<Value> {
        let connection = self.connection.as_ref().ok_or(ClientError::NotConnected)?;
        connection.request(method.as_str(), params).await
    }

    async fn invoke_typed<P, T>(&self, method: Method, params: P) -> Result<T>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let value = self
            .invoke(method, Some(serde_json::to_value(params)?))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn list<T: DeserializeOwned>(&self, namespace: Namespace) -> Result<T> {
        let value = self.invoke(Method::List(namespace), None).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// List the server's tools and refresh the cache
    pub async fn list_tools(&mut self) -> Result<Vec<McpTool>> {
        let result = self.list::<ToolsListResult>(Namespace::Tools).await;
        self.refresh(result.map(|r| r.tools), |remote| &mut remote.tools)
    }

    /// List the server's resources and refresh the cache
    pub async fn list_resources(&mut self) -> Result<Vec<McpResource>> {
        let result = self.list::<ResourcesListResult>(Namespace::Resources).await;
        self.refresh(result.map(|r| r.resources), |remote| &mut remote.resources)
    }

    /// List the server's prompts and refresh the cache
    pub async fn list_prompts(&mut self) -> Result<Vec<McpPrompt>> {
        let result = self.list::<PromptsListResult>(Namespace::Prompts).await;
        self.refresh(result.map(|r| r.prompts), |remote| &mut remote.prompts)
    }

    fn refresh<T: Clone>(
        &mut self,
        result: Result<Vec<T>>,
        slot: impl FnOnce(&mut RemoteCapabilities) -> &mut Option<Vec<T>>,
    ) -> Result<Vec<T>> {
        match (&result, self.remote.as_mut()) {
            (Ok(items), Some(remote)) => *slot(remote) = Some(items.clone()),
            (Err(e), Some(remote)) if e.is_method_not_found() => *slot(remote) = None,
            _ => {}
        }
        result
    }

    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<ToolCallResult> {
        let params = ToolCallParams {
            name: name.to_string(),
            arguments: Some(Value::Object(arguments)),
        };
        self.invoke_typed(Method::Invoke(Namespace::Tools), params)
            .await
    }

    pub async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult> {
        let params = ReadResourceParams {
            uri: uri.to_string(),
        };
        self.invoke_typed(Method::Invoke(Namespace::Resources), params)
            .await
    }

    pub async fn get_prompt(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<GetPromptResult> {
        let params = GetPromptParams {
            name: name.to_string(),
            arguments: Some(arguments.into_iter().collect::<BTreeMap<_, _>>()),
        };
        self.invoke_typed(Method::Invoke(Namespace::Prompts), params)
            .await
    }
}

/// Listing fetched during connect; unsupported or failing listings are cached
/// as absent
async fn fetch<T: DeserializeOwned>(connection: &dyn Connection, namespace: Namespace) -> Option<T> {
    let method = Method::List(namespace);
    let result = connection
        .request(method.as_str(), None)
        .await
        .and_then(|value| Ok(serde_json::from_value(value)?));

    match result {
        Ok(listing) => Some(listing),
        Err(e) if e.is_method_not_found() => {
            debug!("Server does not support {}", method);
            None
        }
        Err(e) => {
            warn!("Failed to fetch {}: {}", method, e);
            None
        }
    }
}
