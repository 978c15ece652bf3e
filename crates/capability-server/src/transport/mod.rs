//! Transport implementations for MCP server

mod stdio;
mod http;

pub use stdio::StdioTransport;
pub use http::HttpTransport;
