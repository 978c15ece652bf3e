//! End-to-end tests of the interactive loop against an in-process server

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::BufReader;

use capability_client::{InteractiveLoop, Mode, Session, ShutdownCoordinator, ShutdownReason};
use capability_core::protocol::{McpTool, ToolCallResult};
use common::{
    connected_session, coordinator_for, counting_registry, disconnect_on_shutdown, run_loop,
    run_loop_bytes, LocalConnector,
};
use serde_json::{Map, Value};

const DISCONNECT_TAIL: &str = "👋 Disconnecting from MCP server...\n✅ Disconnected successfully\n";

fn setup() -> (Arc<LocalConnector>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    (LocalConnector::new(counting_registry(calls.clone())), calls)
}

#[tokio::test]
async fn test_valid_call_invokes_handler_once() {
    let (connector, calls) = setup();
    let session = connected_session(connector).await;
    let coordinator = coordinator_for(&session);

    let output = run_loop(session, coordinator, "call add\n{\"a\": 2, \"b\": 3}\nexit\n").await;

    assert!(output.contains("Enter arguments as JSON (or press Enter for empty args):"));
    assert!(output.contains("required: a, b"), "{output}");
    assert!(output.contains("📤 Tool response:\n5\n"), "{output}");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_argument_is_reported_without_invocation() {
    let (connector, calls) = setup();
    let session = connected_session(connector).await;
    let coordinator = coordinator_for(&session);

    let output = run_loop(session, coordinator, "call add\n{\"a\": 2}\nexit\n").await;

    assert!(
        output.contains("❌ Failed to call tool add: Invalid params: Missing required argument: b"),
        "{output}"
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalid_json_drops_pending_call() {
    let (connector, calls) = setup();
    let session = connected_session(connector).await;
    let coordinator = coordinator_for(&session);

    let output = run_loop(session, coordinator, "call foo\n{not json\nexit\n").await;

    assert!(output.contains("❌ Invalid JSON arguments:"), "{output}");
    assert_eq!(output.matches("Args: ").count(), 1);
    assert_eq!(output.matches("mcp> ").count(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_arguments_line_means_no_arguments() {
    let (connector, calls) = setup();
    let session = connected_session(connector).await;
    let coordinator = coordinator_for(&session);

    let output = run_loop(session, coordinator, "call foo\n\nexit\n").await;

    assert!(output.contains("foo ran"), "{output}");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_exit_during_argument_prompt_ends_output() {
    let (connector, calls) = setup();
    let connection = connector.connection.clone();
    let session = connected_session(connector).await;
    let coordinator = coordinator_for(&session);

    let output = run_loop(session, coordinator.clone(), "call foo\nexit\n").await;

    assert!(output.ends_with(DISCONNECT_TAIL), "{output}");
    let tail = &output[output.find("👋").unwrap()..];
    assert!(!tail.contains("mcp> ") && !tail.contains("Args: "));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(connection.closes.load(Ordering::SeqCst), 1);
    assert_eq!(coordinator.reason(), Some(ShutdownReason::ExitCommand));
}

#[tokio::test]
async fn test_end_of_input_closes_once() {
    let (connector, _) = setup();
    let connection = connector.connection.clone();
    let session = connected_session(connector).await;
    let coordinator = coordinator_for(&session);

    let output = run_loop(session.clone(), coordinator.clone(), "help\n").await;

    assert!(output.contains("Available commands:"));
    assert!(output.ends_with(DISCONNECT_TAIL), "{output}");
    assert_eq!(coordinator.reason(), Some(ShutdownReason::EndOfInput));

    assert!(!coordinator.shutdown(ShutdownReason::Signal("SIGTERM")).await);
    assert_eq!(connection.closes.load(Ordering::SeqCst), 1);
    assert!(!session.lock().await.is_connected());
}

#[tokio::test]
async fn test_empty_resource_listing() {
    let (connector, _) = setup();
    let session = connected_session(connector).await;
    let coordinator = coordinator_for(&session);

    let output = run_loop(session, coordinator, "resources\nexit\n").await;

    assert!(output.contains("No resources available on this server."), "{output}");
}

#[tokio::test]
async fn test_read_while_disconnected_keeps_loop_running() {
    let (connector, _) = setup();
    let session = Arc::new(tokio::sync::Mutex::new(Session::new(connector)));
    let coordinator = coordinator_for(&session);

    let output = run_loop(
        session,
        coordinator,
        "read file:///example.txt\nhelp\nexit\n",
    )
    .await;

    assert!(
        output.contains("❌ Failed to read resource: Not connected to a server"),
        "{output}"
    );
    assert!(output.contains("Available commands:"));
    assert!(output.ends_with(DISCONNECT_TAIL));
}

#[tokio::test]
async fn test_usage_and_unknown_commands() {
    let (connector, _) = setup();
    let session = connected_session(connector).await;
    let coordinator = coordinator_for(&session);

    let output = run_loop(session, coordinator, "call\nread\nprompt\nfrobnicate now\n\nexit\n").await;

    assert!(output.contains("Please specify a tool name. Usage: call <tool_name>"));
    assert!(output.contains("Please specify a resource URI. Usage: read <resource_uri>"));
    assert!(output.contains("Please specify a prompt name. Usage: prompt <prompt_name>"));
    assert!(output.contains("Unknown command: frobnicate. Type \"help\" for available commands."));
    assert!(!output.contains("Args: "));
}

#[tokio::test]
async fn test_unknown_prompt_reads_as_unsupported() {
    let (connector, _) = setup();
    let session = connected_session(connector).await;
    let coordinator = coordinator_for(&session);

    let output = run_loop(session, coordinator, "prompts\nprompt missing\n{}\nexit\n").await;

    assert!(output.contains("No prompts available on this server."), "{output}");
    assert!(output.contains("📝 This server does not support prompt requests."));
}

#[tokio::test]
async fn test_remote_close_fails_calls_but_not_the_loop() {
    let (connector, calls) = setup();
    let connection = connector.connection.clone();
    let session = connected_session(connector).await;

    let closed = Arc::new(AtomicUsize::new(0));
    let observed = closed.clone();
    session.lock().await.on_remote_close(move || {
        observed.fetch_add(1, Ordering::SeqCst);
    });
    let coordinator = coordinator_for(&session);

    connection.drop_remotely();
    let output = run_loop(session, coordinator, "call foo\n{}\nhelp\nexit\n").await;

    assert!(
        output.contains("❌ Failed to call tool foo: Server connection lost"),
        "{output}"
    );
    assert!(output.contains("Available commands:"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_signal_while_waiting_for_input() {
    let (connector, _) = setup();
    let session = connected_session(connector).await;
    let coordinator = coordinator_for(&session);

    // Input that never delivers a line
    let (input, _keep_open) = tokio::io::duplex(64);
    let mut output = Vec::new();
    let mut interactive = InteractiveLoop::new(
        session.clone(),
        coordinator.clone(),
        BufReader::new(input),
        &mut output,
    );

    let signal = async {
        tokio::task::yield_now().await;
        coordinator.shutdown(ShutdownReason::Signal("SIGTERM")).await
    };
    let (outcome, ran) = tokio::join!(interactive.run(), signal);
    outcome.unwrap();
    assert_eq!(interactive.mode(), &Mode::Closed);
    drop(interactive);

    let output = String::from_utf8(output).unwrap();
    assert!(ran);
    assert!(output.contains("🛑 Received SIGTERM, shutting down gracefully..."));
    assert!(output.ends_with(DISCONNECT_TAIL), "{output}");
    assert!(!session.lock().await.is_connected());
}

#[tokio::test]
async fn test_undecodable_line_is_reported_and_loop_continues() {
    let (connector, _) = setup();
    let session = connected_session(connector).await;
    let coordinator = coordinator_for(&session);

    let output = run_loop_bytes(session, coordinator.clone(), b"\xff\xfe\nhelp\nexit\n").await;

    assert!(output.contains("❌ Invalid input:"), "{output}");
    assert!(output.contains("Available commands:"), "{output}");
    assert!(output.ends_with(DISCONNECT_TAIL), "{output}");
    assert_eq!(coordinator.reason(), Some(ShutdownReason::ExitCommand));
}

#[tokio::test]
async fn test_undecodable_arguments_line_keeps_call_pending() {
    let (connector, calls) = setup();
    let session = connected_session(connector).await;
    let coordinator = coordinator_for(&session);

    let output = run_loop_bytes(session, coordinator, b"call foo\n\xc3\x28\n{}\nexit\n").await;

    assert!(output.contains("❌ Invalid input:"), "{output}");
    assert_eq!(output.matches("Args: ").count(), 2);
    assert!(output.contains("foo ran"), "{output}");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_shutdown_during_command_suppresses_next_prompt() {
    let coordinator = ShutdownCoordinator::new();
    let mut registry = counting_registry(Arc::new(AtomicUsize::new(0)));
    let stopper = coordinator.clone();
    registry
        .register_tool(McpTool::new("stop", "Triggers a shutdown"), move |_args: Map<String, Value>| {
            let stopper = stopper.clone();
            async move {
                stopper.trigger(ShutdownReason::Signal("SIGTERM"));
                Ok::<_, anyhow::Error>(ToolCallResult::text("stopping"))
            }
        })
        .unwrap();

    let session = connected_session(LocalConnector::new(registry)).await;
    disconnect_on_shutdown(&coordinator, &session);

    let output = run_loop(session.clone(), coordinator.clone(), "call stop\n{}\nhelp\n").await;

    let response = output.find("📤 Tool response:\nstopping").expect(&output);
    let signal = output.find("🛑 Received SIGTERM, shutting down gracefully...").expect(&output);
    let farewell = output.find("👋").expect(&output);
    assert!(response < signal && signal < farewell, "{output}");
    assert!(!output[response..].contains("mcp> "), "{output}");
    assert!(!output.contains("Available commands:"));
    assert!(output.ends_with(DISCONNECT_TAIL), "{output}");
    assert_eq!(coordinator.reason(), Some(ShutdownReason::Signal("SIGTERM")));
    assert!(!session.lock().await.is_connected());
}
