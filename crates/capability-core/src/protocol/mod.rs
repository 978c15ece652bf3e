//! MCP protocol types and method names

mod capabilities;
mod method;
mod types;

pub use capabilities::{
    LoggingCapability, PromptsCapability, ResourcesCapability, ServerCapabilities,
    ToolsCapability,
};
pub use method::Method;
pub use types::*;
