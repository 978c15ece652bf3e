//! # capability-core
//!
//! Dispatch core shared by the capability servers and the interactive client:
//! - JSON-RPC / MCP protocol types
//! - Capability registry (tools, resources, prompts) with registration-order listing
//! - Request router enforcing the argument and error contract

pub mod error;
mod namespace;
pub mod protocol;
pub mod registry;
pub mod router;

pub use error::{RegistryError, RouterError};
pub use namespace::Namespace;
pub use protocol::{McpError, McpMessage, Method, ServerCapabilities};
pub use registry::{
    CapabilityDescriptor, CapabilityHandler, CapabilityRegistry, PromptHandler, ResourceHandler,
    ToolHandler,
};
pub use router::{Content, RequestRouter};
