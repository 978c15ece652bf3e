//! # capability-server
//!
//! Capability servers speaking newline-delimited JSON-RPC over stdio, or
//! JSON-RPC over HTTP. Each server is a [`capability_core::CapabilityRegistry`]
//! built by one of the [`servers`] modules.

pub mod config;
mod error;
pub mod handler;
mod server;
pub mod servers;
pub mod transport;

pub use config::{MovieConfig, PokemonConfig, Profile, ServerConfig, WeatherConfig};
pub use error::ServerError;
pub use handler::RequestHandler;
pub use server::{CapabilityServer, ServerMode};
pub use transport::{HttpTransport, StdioTransport};
