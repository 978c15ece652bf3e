//! capability-client - interactive client for capability servers
//!
//! Spawns the given server command, connects over stdio and enters the
//! `mcp> ` command loop. Logs go to stderr so they do not interleave with the
//! interactive output.

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::sync::Mutex;
use tracing::warn;

use capability_client::{
    render, ClientConfig, EndpointSpec, InteractiveLoop, Session, ShutdownCoordinator,
    ShutdownReason,
};

const USAGE: &str = "
🔗 MCP Client
Usage: capability-client <server_command> [server_args...]

Examples:
  capability-client capability-server simple
  capability-client capability-server weather --api-key <key>
  capability-client python mcp_server.py

The client will connect to the specified MCP server and enter interactive mode.";

/// Interactive client for capability servers
#[derive(Parser, Debug)]
#[command(name = "capability-client")]
#[command(version)]
#[command(about = "Interactive client for capability servers")]
struct Args {
    /// Seconds a single request may take
    #[arg(long, default_value = "30")]
    request_timeout_secs: u64,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Server command followed by its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    server: Vec<String>,
}

impl Args {
    fn into_config(self) -> Option<ClientConfig> {
        let (command, args) = self.server.split_first()?;
        let endpoint = EndpointSpec::new(command.clone(), args.to_vec());
        Some(
            ClientConfig::new(endpoint)
                .with_request_timeout(Duration::from_secs(self.request_timeout_secs)),
        )
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .init();

    let Some(config) = args.into_config() else {
        println!("{}", USAGE);
        std::process::exit(1);
    };

    let code = match run(config).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("❌ Client error: {:#}", e);
            1
        }
    };

    // A blocked stdin read would keep the runtime alive on a normal return
    std::process::exit(code);
}

async fn run(config: ClientConfig) -> anyhow::Result<()> {
    println!("🔗 Connecting to MCP server: {}", config.endpoint);

    let session = Arc::new(Mutex::new(Session::new(Arc::new(config.connector()))));
    {
        let mut session = session.lock().await;
        session.on_remote_close(|| println!("⚠️  Server connection closed unexpectedly"));
        session.on_remote_error(|e| eprintln!("⚠️  Connection error: {}", e));

        let remote = session
            .connect(&config.endpoint)
            .await
            .context("Failed to connect to MCP server")?;

        println!("✅ Connected successfully to MCP server");
        println!(
            "📋 Server: {} v{}",
            remote.server_info.name, remote.server_info.version
        );
        println!(
            "📋 Server capabilities: {}",
            serde_json::to_string_pretty(&remote.capabilities)?
        );

        println!("\n🔧 Listing available tools...");
        match &remote.tools {
            Some(tools) => println!("{}", render::tools(tools)),
            None => println!("🔧 This server does not support tool listing."),
        }

        println!("\n📂 Listing available resources...");
        match &remote.resources {
            Some(resources) => println!("{}", render::resources(resources)),
            None => println!("📂 This server does not support resource listing."),
        }
    }

    let coordinator = ShutdownCoordinator::new();
    let teardown = session.clone();
    coordinator.on_shutdown(move || async move {
        if let Err(e) = teardown.lock().await.disconnect().await {
            warn!("Error during disconnect: {}", e);
        }
    });
    coordinator.listen_for_signals();

    let stdin = BufReader::new(tokio::io::stdin());
    let mut interactive =
        InteractiveLoop::new(session, coordinator.clone(), stdin, tokio::io::stdout());
    let outcome = interactive.run().await;

    if !coordinator.is_closing() {
        coordinator.shutdown(ShutdownReason::EndOfInput).await;
    }
    coordinator.completed().await;

    outcome.context("Interactive session failed")
}
