//! Capability registry: named tools, resources and prompts bound to handlers

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use crate::error::RegistryError;
use crate::namespace::Namespace;
use crate::protocol::{
    GetPromptResult, McpPrompt, McpResource, McpTool, ResourceContents, ToolCallResult,
};

/// Handler invoked for `tools/call`
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: Map<String, Value>) -> anyhow::Result<ToolCallResult>;
}

/// Handler invoked for `resources/read`
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    async fn read(&self, uri: &str) -> anyhow::Result<Vec<ResourceContents>>;
}

/// Handler invoked for `prompts/get`
#[async_trait]
pub trait PromptHandler: Send + Sync {
    async fn get(&self, arguments: BTreeMap<String, String>) -> anyhow::Result<GetPromptResult>;
}

#[async_trait]
impl<F, Fut> ToolHandler for F
where
    F: Fn(Map<String, Value>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<ToolCallResult>> + Send,
{
    async fn call(&self, arguments: Map<String, Value>) -> anyhow::Result<ToolCallResult> {
        (self)(arguments).await
    }
}

#[async_trait]
impl<F, Fut> ResourceHandler for F
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Vec<ResourceContents>>> + Send,
{
    async fn read(&self, uri: &str) -> anyhow::Result<Vec<ResourceContents>> {
        (self)(uri.to_string()).await
    }
}

#[async_trait]
impl<F, Fut> PromptHandler for F
where
    F: Fn(BTreeMap<String, String>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<GetPromptResult>> + Send,
{
    async fn get(&self, arguments: BTreeMap<String, String>) -> anyhow::Result<GetPromptResult> {
        (self)(arguments).await
    }
}

/// Descriptor of a registered capability
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CapabilityDescriptor {
    Tool(McpTool),
    Resource(McpResource),
    Prompt(McpPrompt),
}

impl CapabilityDescriptor {
    /// Unique key within the namespace (name, or URI for resources)
    pub fn name(&self) -> &str {
        match self {
            CapabilityDescriptor::Tool(tool) => &tool.name,
            CapabilityDescriptor::Resource(resource) => &resource.uri,
            CapabilityDescriptor::Prompt(prompt) => &prompt.name,
        }
    }

    pub fn namespace(&self) -> Namespace {
        match self {
            CapabilityDescriptor::Tool(_) => Namespace::Tools,
            CapabilityDescriptor::Resource(_) => Namespace::Resources,
            CapabilityDescriptor::Prompt(_) => Namespace::Prompts,
        }
    }
}

/// Handler resolved from the registry
#[derive(Clone)]
pub enum CapabilityHandler {
    Tool(Arc<dyn ToolHandler>),
    Resource(Arc<dyn ResourceHandler>),
    Prompt(Arc<dyn PromptHandler>),
}

impl std::fmt::Debug for CapabilityHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapabilityHandler::Tool(_) => f.write_str("CapabilityHandler::Tool"),
            CapabilityHandler::Resource(_) => f.write_str("CapabilityHandler::Resource"),
            CapabilityHandler::Prompt(_) => f.write_str("CapabilityHandler::Prompt"),
        }
    }
}

/// A descriptor together with its handler
pub struct Registered<D, H: ?Sized> {
    pub descriptor: D,
    pub handler: Arc<H>,
}

pub type ToolEntry = Registered<McpTool, dyn ToolHandler>;
pub type ResourceEntry = Registered<McpResource, dyn ResourceHandler>;
pub type PromptEntry = Registered<McpPrompt, dyn PromptHandler>;

/// Registry of capabilities, one map per namespace.
///
/// Listing order is registration order. The registry is built once at
/// startup and shared read-only afterwards.
#[derive(Default)]
pub struct CapabilityRegistry {
    tools: IndexMap<String, ToolEntry>,
    resources: IndexMap<String, ResourceEntry>,
    prompts: IndexMap<String, PromptEntry>,
}

impl CapabilityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool
    pub fn register_tool(
        &mut self,
        tool: McpTool,
        handler: impl ToolHandler + 'static,
    ) -> Result<(), RegistryError> {
        let name = tool.name.clone();
        let entry = Registered {
            descriptor: tool,
            handler: Arc::new(handler) as Arc<dyn ToolHandler>,
        };
        insert(&mut self.tools, Namespace::Tools, name, entry)
    }

    /// Register a resource, keyed by URI
    pub fn register_resource(
        &mut self,
        resource: McpResource,
        handler: impl ResourceHandler + 'static,
    ) -> Result<(), RegistryError> {
        let uri = resource.uri.clone();
        let entry = Registered {
            descriptor: resource,
            handler: Arc::new(handler) as Arc<dyn ResourceHandler>,
        };
        insert(&mut self.resources, Namespace::Resources, uri, entry)
    }

    /// Register a prompt
    pub fn register_prompt(
        &mut self,
        prompt: McpPrompt,
        handler: impl PromptHandler + 'static,
    ) -> Result<(), RegistryError> {
        let name = prompt.name.clone();
        let entry = Registered {
            descriptor: prompt,
            handler: Arc::new(handler) as Arc<dyn PromptHandler>,
        };
        insert(&mut self.prompts, Namespace::Prompts, name, entry)
    }

    /// List descriptors of a namespace in registration order
    pub fn list(&self, namespace: Namespace) -> Vec<CapabilityDescriptor> {
        match namespace {
            Namespace::Tools => self.tools().into_iter().map(CapabilityDescriptor::Tool).collect(),
            Namespace::Resources => self
                .resources()
                .into_iter()
                .map(CapabilityDescriptor::Resource)
                .collect(),
            Namespace::Prompts => self
                .prompts()
                .into_iter()
                .map(CapabilityDescriptor::Prompt)
                .collect(),
        }
    }

    pub fn tools(&self) -> Vec<McpTool> {
        self.tools.values().map(|e| e.descriptor.clone()).collect()
    }

    pub fn resources(&self) -> Vec<McpResource> {
        self.resources.values().map(|e| e.descriptor.clone()).collect()
    }

    pub fn prompts(&self) -> Vec<McpPrompt> {
        self.prompts.values().map(|e| e.descriptor.clone()).collect()
    }

    /// Number of capabilities registered in a namespace
    pub fn len(&self, namespace: Namespace) -> usize {
        match namespace {
            Namespace::Tools => self.tools.len(),
            Namespace::Resources => self.resources.len(),
            Namespace::Prompts => self.prompts.len(),
        }
    }

    /// Check whether nothing at all is registered
    pub fn is_empty(&self) -> bool {
        Namespace::ALL.iter().all(|ns| self.len(*ns) == 0)
    }

    /// Resolve a handler by namespace and name
    pub fn resolve(
        &self,
        namespace: Namespace,
        name: &str,
    ) -> Result<CapabilityHandler, RegistryError> {
        match namespace {
            Namespace::Tools => self
                .tool(name)
                .map(|e| CapabilityHandler::Tool(e.handler.clone())),
            Namespace::Resources => self
                .resource(name)
                .map(|e| CapabilityHandler::Resource(e.handler.clone())),
            Namespace::Prompts => self
                .prompt(name)
                .map(|e| CapabilityHandler::Prompt(e.handler.clone())),
        }
    }

    /// Look up a tool entry
    pub fn tool(&self, name: &str) -> Result<&ToolEntry, RegistryError> {
        self.tools
            .get(name)
            .ok_or_else(|| not_found(Namespace::Tools, name))
    }

    /// Look up a resource entry by URI
    pub fn resource(&self, uri: &str) -> Result<&ResourceEntry, RegistryError> {
        self.resources
            .get(uri)
            .ok_or_else(|| not_found(Namespace::Resources, uri))
    }

    /// Look up a prompt entry
    pub fn prompt(&self, name: &str) -> Result<&PromptEntry, RegistryError> {
        self.prompts
            .get(name)
            .ok_or_else(|| not_found(Namespace::Prompts, name))
    }
}

fn insert<D, H: ?Sized>(
    map: &mut IndexMap<String, Registered<D, H>>,
    namespace: Namespace,
    name: String,
    entry: Registered<D, H>,
) -> Result<(), RegistryError> {
    if map.contains_key(&name) {
        return Err(RegistryError::DuplicateName { namespace, name });
    }

    debug!("Registered {} {}", namespace.singular(), name);
    map.insert(name, entry);
    Ok(())
}

fn not_found(namespace: Namespace, name: &str) -> RegistryError {
    RegistryError::NotFound {
        namespace,
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PromptMessage;

    async fn ok_tool(_args: Map<String, Value>) -> anyhow::Result<ToolCallResult> {
        Ok(ToolCallResult::text("ok"))
    }

    async fn ok_prompt(_args: BTreeMap<String, String>) -> anyhow::Result<GetPromptResult> {
        Ok(GetPromptResult::new(None, vec![PromptMessage::user("hi")]))
    }

    #[test]
    fn test_duplicate_name_in_same_namespace_fails() {
        let mut registry = CapabilityRegistry::new();
        registry
            .register_tool(McpTool::new("echo", "first"), ok_tool)
            .unwrap();

        let err = registry
            .register_tool(McpTool::new("echo", "second"), ok_tool)
            .unwrap_err();

        assert_eq!(
            err,
            RegistryError::DuplicateName {
                namespace: Namespace::Tools,
                name: "echo".to_string()
            }
        );
        assert_eq!(registry.tools()[0].description.as_deref(), Some("first"));
    }

    #[test]
    fn test_same_name_across_namespaces_succeeds() {
        let mut registry = CapabilityRegistry::new();
        registry
            .register_tool(McpTool::new("report", "tool"), ok_tool)
            .unwrap();
        registry
            .register_prompt(McpPrompt::new("report", "prompt"), ok_prompt)
            .unwrap();

        assert_eq!(registry.len(Namespace::Tools), 1);
        assert_eq!(registry.len(Namespace::Prompts), 1);
    }

    #[test]
    fn test_listing_keeps_registration_order() {
        let mut registry = CapabilityRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry
                .register_tool(McpTool::new(name, "tool"), ok_tool)
                .unwrap();
        }

        let names: Vec<String> = registry
            .list(Namespace::Tools)
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_empty_namespace_lists_nothing() {
        let registry = CapabilityRegistry::new();
        assert!(registry.list(Namespace::Resources).is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_resolve_unknown_is_not_found() {
        let registry = CapabilityRegistry::new();
        let err = registry.resolve(Namespace::Prompts, "missing").unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { namespace: Namespace::Prompts, .. }));
    }

    #[tokio::test]
    async fn test_resolve_returns_registered_handler() {
        let mut registry = CapabilityRegistry::new();
        registry
            .register_resource(
                McpResource::new("mem://a", "A"),
                |uri: String| async move {
                    Ok::<_, anyhow::Error>(vec![ResourceContents::text(uri, "text/plain", "a")])
                },
            )
            .unwrap();

        let CapabilityHandler::Resource(handler) =
            registry.resolve(Namespace::Resources, "mem://a").unwrap()
        else {
            panic!("expected a resource handler");
        };
        let contents = handler.read("mem://a").await.unwrap();
        assert_eq!(contents[0].text.as_deref(), Some("a"));
    }
}
