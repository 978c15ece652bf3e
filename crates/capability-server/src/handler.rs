//! MCP request handler

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use capability_core::protocol::{
    GetPromptParams, InitializeParams, InitializeResult, McpError, McpMessage, Method,
    PromptsListResult, ReadResourceParams, ResourcesListResult, ServerCapabilities, ServerInfo,
    ToolCallParams, ToolsListResult, MCP_VERSION,
};
use capability_core::{Namespace, RequestRouter};

/// Handler for MCP requests
pub struct RequestHandler {
    /// Router over the server's capability registry
    router: RequestRouter,
    /// Server identity reported on initialize
    server_info: ServerInfo,
    /// Whether the session is initialized
    initialized: AtomicBool,
}

impl RequestHandler {
    /// Create a new request handler
    pub fn new(router: RequestRouter, server_info: ServerInfo) -> Self {
        Self {
            router,
            server_info,
            initialized: AtomicBool::new(false),
        }
    }

    /// Whether a client has completed the initialize request
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Handle an incoming message
    pub async fn handle(&self, message: McpMessage) -> Option<McpMessage> {
        if message.is_request() {
            let method = message.method.unwrap_or_default();
            let id = message.id.unwrap_or(Value::Null);

            debug!("Handling request: {}", method);

            let result = self.dispatch(&method, message.params).await;

            Some(match result {
                Ok(result) => McpMessage::response(id, result),
                Err(error) => McpMessage::error_response(Some(id), error),
            })
        } else if message.is_notification() {
            let method = message.method.unwrap_or_default();
            debug!("Received notification: {}", method);

            match method.as_str() {
                "notifications/initialized" | "initialized" => {
                    info!("Client initialized");
                }
                "notifications/cancelled" => {
                    debug!("Request cancelled");
                }
                _ => {
                    debug!("Unknown notification: {}", method);
                }
            }

            None
        } else {
            // Response - we don't expect these in server mode
            debug!("Received unexpected response");
            None
        }
    }

    /// Dispatch a request by JSON-RPC method name
    pub async fn dispatch(&self, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        let Some(method) = Method::parse(method) else {
            return Err(McpError::method_not_found(format!(
                "Method not found: {}",
                method
            )));
        };

        match method {
            Method::Initialize => self.handle_initialize(params),
            Method::Ping => Ok(serde_json::json!({})),
            Method::List(namespace) => self.handle_list(namespace),
            Method::Invoke(namespace) => self.handle_invoke(namespace, params).await,
        }
    }

    /// Handle initialize request
    fn handle_initialize(&self, params: Option<Value>) -> Result<Value, McpError> {
        let params: InitializeParams = parse_params(params)?;

        info!(
            "Initializing session with client: {} v{}",
            params.client_info.name, params.client_info.version
        );

        self.initialized.store(true, Ordering::SeqCst);

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities::with_all(),
            server_info: self.server_info.clone(),
        };

        to_value(result)
    }

    /// Handle tools/list, resources/list and prompts/list
    fn handle_list(&self, namespace: Namespace) -> Result<Value, McpError> {
        let registry = self.router.registry();
        match namespace {
            Namespace::Tools => to_value(ToolsListResult {
                tools: registry.tools(),
            }),
            Namespace::Resources => to_value(ResourcesListResult {
                resources: registry.resources(),
            }),
            Namespace::Prompts => to_value(PromptsListResult {
                prompts: registry.prompts(),
            }),
        }
    }

    /// Handle tools/call, resources/read and prompts/get
    async fn handle_invoke(
        &self,
        namespace: Namespace,
        params: Option<Value>,
    ) -> Result<Value, McpError> {
        let (target, arguments) = match namespace {
            Namespace::Tools => {
                let params: ToolCallParams = parse_params(params)?;
                (params.name, params.arguments.unwrap_or(Value::Null))
            }
            Namespace::Resources => {
                let params: ReadResourceParams = parse_params(params)?;
                (params.uri, Value::Null)
            }
            Namespace::Prompts => {
                let params: GetPromptParams = parse_params(params)?;
                let arguments = params
                    .arguments
                    .map(|args| Value::Object(args.into_iter().collect()))
                    .unwrap_or(Value::Null);
                (params.name, arguments)
            }
        };

        match self.router.handle(namespace, &target, arguments).await {
            Ok(content) => to_value(content),
            Err(e) => {
                warn!("{} {} failed: {}", namespace.singular(), target, e);
                Err(e.into())
            }
        }
    }
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, McpError> {
    params
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| McpError::invalid_params(e.to_string()))?
        .ok_or_else(|| McpError::invalid_params("Missing params"))
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value, McpError> {
    serde_json::to_value(value).map_err(|e| McpError::internal_error(e.to_string()))
}
