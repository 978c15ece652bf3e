//! Request router: resolves a capability, checks its arguments and invokes it

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::RouterError;
use crate::namespace::Namespace;
use crate::protocol::{GetPromptResult, ReadResourceResult, ToolCallResult};
use crate::registry::{CapabilityDescriptor, CapabilityRegistry};

/// Successful result of a routed invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Content {
    Tool(ToolCallResult),
    Resource(ReadResourceResult),
    Prompt(GetPromptResult),
}

/// Routes invocations to the handlers of a [`CapabilityRegistry`].
///
/// The router holds no mutable state; cloning it shares the registry.
#[derive(Clone)]
pub struct RequestRouter {
    registry: Arc<CapabilityRegistry>,
}

impl RequestRouter {
    /// Create a router over a finished registry
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        Self { registry }
    }

    /// Registry backing this router
    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// List a namespace; an empty namespace is an empty listing
    pub fn list(&self, namespace: Namespace) -> Vec<CapabilityDescriptor> {
        self.registry.list(namespace)
    }

    /// Invoke the capability `target` (a name, or a URI for resources).
    ///
    /// Unknown targets fail with [`RouterError::MethodNotFound`]. Missing
    /// required arguments fail with [`RouterError::InvalidParams`] before the
    /// handler runs. Handler failures become [`RouterError::Internal`] unless
    /// the handler already returned a `RouterError`.
    pub async fn handle(
        &self,
        namespace: Namespace,
        target: &str,
        params: Value,
    ) -> Result<Content, RouterError> {
        match namespace {
            Namespace::Tools => {
                let entry = self.registry.tool(target)?;
                let arguments = tool_arguments(params)?;
                ensure_present(
                    entry
                        .descriptor
                        .input_schema
                        .required_arguments()
                        .iter()
                        .map(String::as_str),
                    |name| arguments.get(name).is_some_and(|v| !v.is_null()),
                )?;

                debug!("Calling tool: {}", target);
                let result = entry
                    .handler
                    .call(arguments)
                    .await
                    .map_err(|e| handler_failure(namespace, target, e))?;
                Ok(Content::Tool(result))
            }
            Namespace::Resources => {
                let entry = self.registry.resource(target)?;

                debug!("Reading resource: {}", target);
                let contents = entry
                    .handler
                    .read(target)
                    .await
                    .map_err(|e| handler_failure(namespace, target, e))?;
                Ok(Content::Resource(ReadResourceResult { contents }))
            }
            Namespace::Prompts => {
                let entry = self.registry.prompt(target)?;
                let arguments = prompt_arguments(params)?;
                ensure_present(entry.descriptor.required_arguments(), |name| {
                    arguments.contains_key(name)
                })?;

                debug!("Rendering prompt: {}", target);
                let result = entry
                    .handler
                    .get(arguments)
                    .await
                    .map_err(|e| handler_failure(namespace, target, e))?;
                Ok(Content::Prompt(result))
            }
        }
    }
}

/// Tool arguments must be an object; absent arguments mean `{}`
fn tool_arguments(params: Value) -> Result<Map<String, Value>, RouterError> {
    match params {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map),
        other => Err(RouterError::InvalidParams(format!(
            "Arguments must be a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Prompt arguments are strings; other scalars are carried as their JSON text
fn prompt_arguments(params: Value) -> Result<BTreeMap<String, String>, RouterError> {
    let map = tool_arguments(params)?;
    Ok(map
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| match value {
            Value::String(s) => (key, s),
            other => (key, other.to_string()),
        })
        .collect())
}

fn ensure_present<'a>(
    required: impl Iterator<Item = &'a str>,
    present: impl Fn(&str) -> bool,
) -> Result<(), RouterError> {
    let missing: Vec<&str> = required.filter(|name| !present(name)).collect();
    if missing.is_empty() {
        return Ok(());
    }

    Err(RouterError::InvalidParams(format!(
        "Missing required argument{}: {}",
        if missing.len() == 1 { "" } else { "s" },
        missing.join(", ")
    )))
}

fn handler_failure(namespace: Namespace, target: &str, err: anyhow::Error) -> RouterError {
    match err.downcast::<RouterError>() {
        Ok(typed) => typed,
        Err(err) => {
            warn!("{} {} failed: {:#}", namespace.singular(), target, err);
            RouterError::Internal(format!("{:#}", err))
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
