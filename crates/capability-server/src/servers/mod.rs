//! Capability sets served by the `capability-server` binary

pub mod api;
pub mod cities;
pub mod colombia;
pub mod movies;
pub mod pokemon;
pub mod simple;
pub mod weather;

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::config::{Profile, ServerConfig};
use crate::ServerError;
use capability_core::protocol::ServerInfo;
use capability_core::{CapabilityRegistry, RouterError};

/// Build the registry and identity for the configured profile
pub fn build(config: &ServerConfig) -> Result<(CapabilityRegistry, ServerInfo), ServerError> {
    let registry = match config.profile {
        Profile::Simple => simple::registry()?,
        Profile::Weather => weather::registry(config.weather.clone())?,
        Profile::Cities => cities::registry()?,
        Profile::Movies => movies::registry(config.movies.clone())?,
        Profile::Pokemon => pokemon::registry(config.pokemon.clone())?,
    };

    let server_info = ServerInfo {
        name: config.profile.server_name().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    Ok((registry, server_info))
}

/// Required string argument of a tool call
pub(crate) fn string_arg<'a>(
    args: &'a Map<String, Value>,
    name: &str,
) -> Result<&'a str, RouterError> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(name, "a string"))
}

/// Required numeric argument of a tool call
pub(crate) fn number_arg(args: &Map<String, Value>, name: &str) -> Result<f64, RouterError> {
    args.get(name)
        .and_then(Value::as_f64)
        .ok_or_else(|| invalid(name, "a number"))
}

/// Optional positive integer argument, e.g. a page number
pub(crate) fn page_arg(args: &Map<String, Value>, name: &str) -> Result<u64, RouterError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(1),
        Some(value) => value
            .as_u64()
            .filter(|page| *page >= 1)
            .ok_or_else(|| invalid(name, "a positive integer")),
    }
}

fn invalid(name: &str, expected: &str) -> RouterError {
    RouterError::InvalidParams(format!("Argument '{}' must be {}", name, expected))
}

/// Prompt argument by name
pub(crate) fn arg<'a>(args: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    args.get(name).map(String::as_str).filter(|v| !v.is_empty())
}
