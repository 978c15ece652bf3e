//! In-process connections for driving the client against a real request
//! handler without spawning a process

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::BufReader;
use tokio::sync::mpsc;

use capability_client::{
    ClientError, Connection, ConnectionEvent, Connector, EndpointSpec, InteractiveLoop, Result,
    Session, ShutdownCoordinator,
};
use capability_core::protocol::{McpInputSchema, McpTool, ServerInfo, ToolCallResult};
use capability_core::{CapabilityRegistry, RequestRouter, RouterError};
use capability_server::RequestHandler;

/// Connection that hands requests straight to a server-side handler
pub struct LocalConnection {
    handler: RequestHandler,
    lost: AtomicBool,
    events_tx: mpsc::UnboundedSender<ConnectionEvent>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<ConnectionEvent>>>,
    pub closes: AtomicUsize,
}

impl LocalConnection {
    pub fn new(registry: CapabilityRegistry) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            handler: RequestHandler::new(
                RequestRouter::new(Arc::new(registry)),
                ServerInfo {
                    name: "test-capability-server".to_string(),
                    version: "0.0.1".to_string(),
                },
            ),
            lost: AtomicBool::new(false),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
            closes: AtomicUsize::new(0),
        }
    }

    /// Simulate the server going away
    pub fn drop_remotely(&self) {
        self.lost.store(true, Ordering::SeqCst);
        let _ = self.events_tx.send(ConnectionEvent::Closed);
    }
}

#[async_trait]
impl Connection for LocalConnection {
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        if self.lost.load(Ordering::SeqCst) {
            return Err(ClientError::ConnectionLost);
        }
        self.handler
            .dispatch(method, params)
            .await
            .map_err(|e| ClientError::Remote(RouterError::from(e)))
    }

    async fn notify(&self, _method: &str, _params: Option<Value>) -> Result<()> {
        if self.lost.load(Ordering::SeqCst) {
            return Err(ClientError::ConnectionLost);
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<ConnectionEvent>> {
        self.events_rx.lock().ok()?.take()
    }
}

/// Connector handing out one shared [`LocalConnection`]
pub struct LocalConnector {
    pub connection: Arc<LocalConnection>,
}

impl LocalConnector {
    pub fn new(registry: CapabilityRegistry) -> Arc<Self> {
        Arc::new(Self {
            connection: Arc::new(LocalConnection::new(registry)),
        })
    }
}

#[async_trait]
impl Connector for LocalConnector {
    async fn connect(&self, _endpoint: &EndpointSpec) -> Result<Arc<dyn Connection>> {
        Ok(self.connection.clone())
    }
}

pub fn endpoint() -> EndpointSpec {
    EndpointSpec::new("capability-server", vec!["simple".to_string()])
}

/// Registry with a `foo` tool counting its invocations and an `add` tool
pub fn counting_registry(calls: Arc<AtomicUsize>) -> CapabilityRegistry {
    let mut registry = CapabilityRegistry::new();

    let foo_calls = calls.clone();
    registry
        .register_tool(McpTool::new("foo", "Counts invocations"), move |_args: Map<String, Value>| {
            let calls = foo_calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>(ToolCallResult::text("foo ran"))
            }
        })
        .unwrap();

    let add_calls = calls;
    registry
        .register_tool(
            McpTool::new("add", "Add two numbers").with_schema(
                McpInputSchema::default()
                    .property("a", json!({"type": "number"}), true)
                    .property("b", json!({"type": "number"}), true),
            ),
            move |args: Map<String, Value>| {
                let calls = add_calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    let a = args["a"].as_f64().unwrap_or_default();
                    let b = args["b"].as_f64().unwrap_or_default();
                    Ok::<_, anyhow::Error>(ToolCallResult::text(format!("{}", a + b)))
                }
            },
        )
        .unwrap();

    registry
}

/// Session connected to `connector`
pub async fn connected_session(connector: Arc<LocalConnector>) -> Arc<tokio::sync::Mutex<Session>> {
    let mut session = Session::new(connector);
    session.connect(&endpoint()).await.unwrap();
    Arc::new(tokio::sync::Mutex::new(session))
}

/// Shutdown coordinator whose teardown disconnects `session`
pub fn coordinator_for(session: &Arc<tokio::sync::Mutex<Session>>) -> ShutdownCoordinator {
    let coordinator = ShutdownCoordinator::new();
    disconnect_on_shutdown(&coordinator, session);
    coordinator
}

/// Register the teardown that disconnects `session`
pub fn disconnect_on_shutdown(
    coordinator: &ShutdownCoordinator,
    session: &Arc<tokio::sync::Mutex<Session>>,
) {
    let teardown = session.clone();
    coordinator.on_shutdown(move || async move {
        let _ = teardown.lock().await.disconnect().await;
    });
}

/// Feed `input` to a loop and return everything it printed
pub async fn run_loop(
    session: Arc<tokio::sync::Mutex<Session>>,
    coordinator: ShutdownCoordinator,
    input: &str,
) -> String {
    run_loop_bytes(session, coordinator, input.as_bytes()).await
}

/// Like [`run_loop`] for input that need not be UTF-8
pub async fn run_loop_bytes(
    session: Arc<tokio::sync::Mutex<Session>>,
    coordinator: ShutdownCoordinator,
    input: &[u8],
) -> String {
    let mut output = Vec::new();
    let mut interactive = InteractiveLoop::new(
        session,
        coordinator,
        BufReader::new(input),
        &mut output,
    );
    interactive.run().await.unwrap();
    drop(interactive);
    String::from_utf8(output).unwrap()
}
