//! capability-server - serves one capability set over stdio or HTTP
//!
//! stdio is the default so an interactive client can spawn the server as a
//! child process. Logs always go to stderr; stdout carries protocol frames.

use anyhow::Context;
use clap::Parser;
use std::time::Duration;
use tracing::info;

use capability_server::config::{Profile, ServerConfig};
use capability_server::{servers, CapabilityServer, ServerMode};

/// Capability server exposing tools, resources and prompts over JSON-RPC
#[derive(Parser, Debug)]
#[command(name = "capability-server")]
#[command(version)]
#[command(about = "Capability server exposing tools, resources and prompts over JSON-RPC")]
struct Args {
    /// Capability set to serve
    #[arg(value_enum, default_value_t = Profile::Simple)]
    profile: Profile,

    /// Run in HTTP mode instead of stdio
    #[arg(long)]
    http: bool,

    /// Port for HTTP server
    #[arg(long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Provider API key (weather: OPENWEATHER_API_KEY, movies: TMDB_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Override the provider API base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Provider request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<ServerConfig> {
        let api_key = self.api_key.or_else(|| {
            let var = match self.profile {
                Profile::Weather => "OPENWEATHER_API_KEY",
                Profile::Movies => "TMDB_API_KEY",
                Profile::Simple | Profile::Cities | Profile::Pokemon => return None,
            };
            std::env::var(var).ok()
        });

        let config = ServerConfig {
            profile: self.profile,
            http_port: self.http.then_some(self.port),
            ..Default::default()
        }
        .with_provider(
            api_key,
            self.base_url,
            self.timeout_secs.map(Duration::from_secs),
        )?;

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = args.into_config().context("Invalid configuration")?;
    let (registry, server_info) =
        servers::build(&config).context("Failed to build capability registry")?;

    info!(
        "Serving {} v{} with {} tools, {} resources, {} prompts",
        server_info.name,
        server_info.version,
        registry.tools().len(),
        registry.resources().len(),
        registry.prompts().len()
    );

    let mode = match config.http_port {
        Some(port) => ServerMode::Http { port },
        None => ServerMode::Stdio,
    };

    CapabilityServer::new(registry, server_info)
        .with_mode(mode)
        .run()
        .await
        .context("Server terminated with an error")?;

    Ok(())
}
