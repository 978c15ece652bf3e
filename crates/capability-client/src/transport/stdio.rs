//! stdio transport: spawn the server as a child process and exchange
//! newline-delimited JSON-RPC over its stdin/stdout

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{Connection, ConnectionEvent, Connector, EndpointSpec};
use crate::error::{ClientError, Result};
use capability_core::protocol::McpMessage;
use capability_core::RouterError;

/// How long a closing server gets to exit on its own before it is killed
const EXIT_GRACE: Duration = Duration::from_secs(2);

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value>>>>>;
type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// Connector spawning servers as child processes
#[derive(Debug, Clone)]
pub struct StdioConnector {
    request_timeout: Duration,
}

impl StdioConnector {
    pub fn new(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }
}

#[async_trait]
impl Connector for StdioConnector {
    async fn connect(&self, endpoint: &EndpointSpec) -> Result<Arc<dyn Connection>> {
        let connection = StdioConnection::spawn(endpoint, self.request_timeout)?;
        Ok(Arc::new(connection))
    }
}

/// A live stdio connection.
///
/// Requests are matched to responses by id, so a reader task owns the
/// server's stdout while callers wait on per-request channels.
pub struct StdioConnection {
    command: String,
    child: Mutex<Option<Child>>,
    stdin: Mutex<Option<Writer>>,
    pending: Pending,
    next_id: AtomicU64,
    /// Cleared by the reader task once the server's output ends
    alive: Arc<AtomicBool>,
    /// Set when the close was asked for locally
    closing: Arc<AtomicBool>,
    events: std::sync::Mutex<Option<mpsc::UnboundedReceiver<ConnectionEvent>>>,
    reader: JoinHandle<()>,
    request_timeout: Duration,
}

impl StdioConnection {
    /// Spawn the endpoint's server process and attach to its stdio
    pub fn spawn(endpoint: &EndpointSpec, request_timeout: Duration) -> Result<Self> {
        info!("Spawning capability server: {}", endpoint);

        let mut child = Command::new(&endpoint.command)
            .args(&endpoint.args)
            .envs(&endpoint.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| ClientError::Transport(format!("failed to spawn '{}': {}", endpoint, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ClientError::Transport("failed to get server stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClientError::Transport("failed to get server stdout".to_string()))?;

        let mut connection = Self::from_streams(stdout, stdin, request_timeout);
        connection.command = endpoint.to_string();
        connection.child = Mutex::new(Some(child));
        Ok(connection)
    }

    /// Build a connection over an arbitrary reader/writer pair
    pub fn from_streams<R, W>(reader: R, writer: W, request_timeout: Duration) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let alive = Arc::new(AtomicBool::new(true));
        let closing = Arc::new(AtomicBool::new(false));
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let reader = tokio::spawn(read_loop(
            reader,
            pending.clone(),
            alive.clone(),
            closing.clone(),
            events_tx,
        ));

        Self {
            command: String::new(),
            child: Mutex::new(None),
            stdin: Mutex::new(Some(Box::new(writer))),
            pending,
            next_id: AtomicU64::new(1),
            alive,
            closing,
            events: std::sync::Mutex::new(Some(events_rx)),
            reader,
            request_timeout,
        }
    }

    /// Server command line, for diagnostics
    pub fn command(&self) -> &str {
        &self.command
    }

    async fn send(&self, message: &McpMessage) -> Result<()> {
        let line = serde_json::to_string(message)?;
        debug!("Sending to server: {}", line);

        let mut stdin = self.stdin.lock().await;
        let writer = stdin.as_mut().ok_or(ClientError::ConnectionLost)?;

        let written = async {
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await
        }
        .await;

        written.map_err(|e| match e.kind() {
            ErrorKind::BrokenPipe | ErrorKind::ConnectionReset => ClientError::ConnectionLost,
            _ => ClientError::Io(e),
        })
    }
}

#[async_trait]
impl Connection for StdioConnection {
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();

        self.pending.lock().await.insert(id, tx);
        if !self.alive.load(Ordering::SeqCst) {
            self.pending.lock().await.remove(&id);
            return Err(ClientError::ConnectionLost);
        }

        if let Err(e) = self.send(&McpMessage::request(id, method, params)).await {
            self.pending.lock().await.remove(&id);
            return Err(e);
        }

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ClientError::ConnectionLost),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(ClientError::Transport(format!(
                    "{} timed out after {}s",
                    method,
                    self.request_timeout.as_secs()
                )))
            }
        }
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        self.send(&McpMessage::notification(method, params)).await
    }

    async fn close(&self) -> Result<()> {
        if self.closing.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        // Dropping stdin is the server's cue to exit
        self.stdin.lock().await.take();

        if let Some(mut child) = self.child.lock().await.take() {
            match tokio::time::timeout(EXIT_GRACE, child.wait()).await {
                Ok(Ok(status)) => debug!("Server {} exited with {}", self.command, status),
                Ok(Err(e)) => warn!("Failed to wait for server {}: {}", self.command, e),
                Err(_) => {
                    warn!("Server {} did not exit, killing it", self.command);
                    child.kill().await?;
                }
            }
        }

        self.reader.abort();
        Ok(())
    }

    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<ConnectionEvent>> {
        self.events.lock().ok()?.take()
    }
}

impl Drop for StdioConnection {
    fn drop(&mut self) {
        if let Some(child) = self.child.get_mut().as_mut() {
            debug!("Dropping connection, killing server {}", self.command);
            let _ = child.start_kill();
        }
        self.reader.abort();
    }
}

async fn read_loop<R>(
    reader: R,
    pending: Pending,
    alive: Arc<AtomicBool>,
    closing: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<ConnectionEvent>,
) where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                debug!("Received from server: {}", line);
                route(line, &pending, &events).await;
            }
            Ok(None) => break,
            Err(e) => {
                if !closing.load(Ordering::SeqCst) {
                    let _ = events.send(ConnectionEvent::Error(e.to_string()));
                }
                break;
            }
        }
    }

    alive.store(false, Ordering::SeqCst);
    // Dropping the senders fails every waiting request with ConnectionLost
    pending.lock().await.clear();

    if !closing.load(Ordering::SeqCst) {
        info!("Server closed its output");
        let _ = events.send(ConnectionEvent::Closed);
    }
}

async fn route(
    line: &str,
    pending: &Pending,
    events: &mpsc::UnboundedSender<ConnectionEvent>,
) {
    let message: McpMessage = match serde_json::from_str(line) {
        Ok(message) => message,
        Err(e) => {
            warn!("Unparseable message from server: {}", e);
            let _ = events.send(ConnectionEvent::Error(format!(
                "invalid message from server: {}",
                e
            )));
            return;
        }
    };

    if !message.is_response() {
        debug!("Ignoring server-initiated message: {:?}", message.method);
        return;
    }

    let Some(id) = message.id.as_ref().and_then(Value::as_u64) else {
        // Errors without an id (e.g. parse errors) cannot be matched to a caller
        if let Some(error) = message.error {
            let _ = events.send(ConnectionEvent::Error(error.to_string()));
        }
        return;
    };

    let Some(waiter) = pending.lock().await.remove(&id) else {
        debug!("No pending request for response id {}", id);
        return;
    };

    let result = match message.error {
        Some(error) => Err(ClientError::Remote(RouterError::from(error))),
        None => Ok(message.result.unwrap_or(Value::Null)),
    };
    let _ = waiter.send(result);
}

#[cfg(test)]
mod tests {
    use super::*;
    use capability_core::RequestRouter;
    use capability_server::servers::simple;
    use capability_server::{RequestHandler, StdioTransport};
    use capability_core::protocol::ServerInfo;
    use serde_json::json;

    /// Connection wired to an in-process stdio server
    fn connect_in_process() -> (StdioConnection, JoinHandle<()>) {
        let (client_io, server_io) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server_io);
        let (client_read, client_write) = tokio::io::split(client_io);

        let handler = RequestHandler::new(
            RequestRouter::new(Arc::new(simple::registry().unwrap())),
            ServerInfo {
                name: "simple-capability-server".to_string(),
                version: "0.1.0".to_string(),
            },
        );
        let server = tokio::spawn(async move {
            let transport = StdioTransport::new(Arc::new(handler));
            let _ = transport
                .serve(BufReader::new(server_read), server_write)
                .await;
        });

        let connection =
            StdioConnection::from_streams(client_read, client_write, Duration::from_secs(5));
        (connection, server)
    }

    #[tokio::test]
    async fn test_request_round_trip() {
        let (connection, _server) = connect_in_process();

        let result = connection
            .request(
                "tools/call",
                Some(json!({"name": "add", "arguments": {"a": 2, "b": 3}})),
            )
            .await
            .unwrap();

        assert_eq!(result["content"][0]["text"], "The sum of 2 and 3 is 5");
    }

    #[tokio::test]
    async fn test_error_response_becomes_remote_error() {
        let (connection, _server) = connect_in_process();

        let err = connection
            .request("resources/subscribe", None)
            .await
            .unwrap_err();
        assert!(err.is_method_not_found(), "{err}");

        let err = connection
            .request("tools/call", Some(json!({"name": "add", "arguments": {"a": 2}})))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Remote(RouterError::InvalidParams(_))));
    }

    #[tokio::test]
    async fn test_server_eof_fires_closed_once() {
        let (client_io, server_io) = tokio::io::duplex(1024);
        let (client_read, client_write) = tokio::io::split(client_io);
        let connection =
            StdioConnection::from_streams(client_read, client_write, Duration::from_secs(5));
        let mut events = connection.take_events().unwrap();
        assert!(connection.take_events().is_none());

        drop(server_io);

        assert_eq!(events.recv().await, Some(ConnectionEvent::Closed));
        assert_eq!(events.recv().await, None);

        let err = connection.request("ping", None).await.unwrap_err();
        assert!(matches!(err, ClientError::ConnectionLost), "{err}");
    }

    #[tokio::test]
    async fn test_local_close_fires_no_event() {
        let (connection, _server) = connect_in_process();
        let mut events = connection.take_events().unwrap();

        connection.close().await.unwrap();
        connection.close().await.unwrap();

        assert_eq!(events.recv().await, None);
    }

    #[tokio::test]
    async fn test_spawn_failure_is_transport_error() {
        let endpoint = EndpointSpec::new("/nonexistent/capability-server", vec![]);
        let err = StdioConnector::new(Duration::from_secs(1))
            .connect(&endpoint)
            .await
            .err()
            .unwrap();

        assert!(matches!(err, ClientError::Transport(_)), "{err}");
    }
}
