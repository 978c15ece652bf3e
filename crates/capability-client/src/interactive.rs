//! Interactive command loop
//!
//! The loop is a small state machine over an async line reader:
//!
//! - `AwaitingCommand`: prints `mcp> ` and dispatches the next command
//! - `AwaitingArguments`: prints `Args: ` and completes a pending `call` or
//!   `prompt` with the JSON arguments typed on that line
//! - `Closed`: the input has been released and nothing is read or prompted
//!
//! Every read races the shutdown coordinator's closing token, so `exit`, end
//! of input and termination signals all end the loop without another prompt.

use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::debug;

use crate::command::Command;
use crate::error::{ClientError, Result};
use crate::render::{self, Operation};
use crate::session::Session;
use crate::shutdown::{ShutdownCoordinator, ShutdownReason};

const COMMAND_PROMPT: &str = "mcp> ";
const ARGUMENTS_PROMPT: &str = "Args: ";

/// Invocation waiting for its arguments line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingCommand {
    CallTool(String),
    GetPrompt(String),
}

/// Loop state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    AwaitingCommand,
    AwaitingArguments(PendingCommand),
    Closed,
}

enum Input {
    Line(String),
    Invalid(std::string::FromUtf8Error),
    EndOfInput,
    Closing,
}

/// Interactive loop reading commands from `R` and writing to `W`
pub struct InteractiveLoop<R, W> {
    session: Arc<Mutex<Session>>,
    coordinator: ShutdownCoordinator,
    input: Option<R>,
    output: W,
    mode: Mode,
}

impl<R, W> InteractiveLoop<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(
        session: Arc<Mutex<Session>>,
        coordinator: ShutdownCoordinator,
        input: R,
        output: W,
    ) -> Self {
        Self {
            session,
            coordinator,
            input: Some(input),
            output,
            mode: Mode::AwaitingCommand,
        }
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// Run until `exit`, end of input or a shutdown trigger
    pub async fn run(&mut self) -> Result<()> {
        self.say("\n🎮 Entering interactive mode. Type \"help\" for commands.")
            .await?;

        loop {
            if self.coordinator.is_closing() && self.mode != Mode::Closed {
                let reason = self.coordinator.reason().unwrap_or(ShutdownReason::EndOfInput);
                self.close(reason).await?;
            }

            match self.mode.clone() {
                Mode::Closed => break,
                Mode::AwaitingCommand => match self.read(COMMAND_PROMPT).await? {
                    Input::Line(line) => self.dispatch(Command::parse(&line)).await?,
                    Input::Invalid(e) => self.reject(e).await?,
                    Input::EndOfInput => self.close(ShutdownReason::EndOfInput).await?,
                    Input::Closing => continue,
                },
                Mode::AwaitingArguments(pending) => match self.read(ARGUMENTS_PROMPT).await? {
                    Input::Line(line) if line.trim().eq_ignore_ascii_case("exit") => {
                        self.close(ShutdownReason::ExitCommand).await?
                    }
                    Input::Line(line) => {
                        self.mode = Mode::AwaitingCommand;
                        self.complete(pending, &line).await?
                    }
                    Input::Invalid(e) => self.reject(e).await?,
                    Input::EndOfInput => self.close(ShutdownReason::EndOfInput).await?,
                    Input::Closing => continue,
                },
            }

            tokio::task::yield_now().await;
        }

        Ok(())
    }

    async fn read(&mut self, prompt: &str) -> Result<Input> {
        let closing = self.coordinator.closing();
        if closing.is_cancelled() {
            return Ok(Input::Closing);
        }

        self.output.write_all(prompt.as_bytes()).await?;
        self.output.flush().await?;

        let Some(input) = self.input.as_mut() else {
            return Ok(Input::EndOfInput);
        };

        // Raw bytes so an undecodable line is consumed whole and reported
        let mut bytes = Vec::new();
        tokio::select! {
            biased;
            _ = closing.cancelled() => Ok(Input::Closing),
            read = input.read_until(b'\n', &mut bytes) => match read? {
                0 => Ok(Input::EndOfInput),
                _ => Ok(String::from_utf8(bytes).map_or_else(Input::Invalid, Input::Line)),
            },
        }
    }

    /// Report a line that is not UTF-8 and stay in the current mode
    async fn reject(&mut self, e: std::string::FromUtf8Error) -> Result<()> {
        debug!("Discarding undecodable input line: {}", e);
        self.say(&format!("❌ Invalid input: {}", e.utf8_error()))
            .await
    }

    async fn say(&mut self, text: &str) -> Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await?;
        Ok(())
    }

    async fn dispatch(&mut self, command: Command) -> Result<()> {
        debug!("Dispatching {:?}", command);

        match command {
            Command::Empty => Ok(()),
            Command::Help => self.say(render::HELP).await,
            Command::Tools => {
                let listed = self.session.lock().await.list_tools().await;
                let text = match listed {
                    Ok(tools) => render::tools(&tools),
                    Err(e) => render::failure(Operation::ListTools, &e),
                };
                self.say(&text).await
            }
            Command::Resources => {
                let listed = self.session.lock().await.list_resources().await;
                let text = match listed {
                    Ok(resources) => render::resources(&resources),
                    Err(e) => render::failure(Operation::ListResources, &e),
                };
                self.say(&text).await
            }
            Command::Prompts => {
                let listed = self.session.lock().await.list_prompts().await;
                let text = match listed {
                    Ok(prompts) => render::prompts(&prompts),
                    Err(e) => render::failure(Operation::ListPrompts, &e),
                };
                self.say(&text).await
            }
            Command::Read(None) => {
                self.say("Please specify a resource URI. Usage: read <resource_uri>")
                    .await
            }
            Command::Read(Some(uri)) => {
                let read = self.session.lock().await.read_resource(&uri).await;
                let text = match read {
                    Ok(contents) => render::resource_contents(&contents),
                    Err(e) => render::failure(Operation::ReadResource, &e),
                };
                self.say(&text).await
            }
            Command::Call(None) => {
                self.say("Please specify a tool name. Usage: call <tool_name>")
                    .await
            }
            Command::Call(Some(tool)) => {
                let required = {
                    let session = self.session.lock().await;
                    session
                        .remote()
                        .and_then(|remote| remote.tool(&tool))
                        .map(|descriptor| descriptor.input_schema.required_arguments().to_vec())
                        .unwrap_or_default()
                };
                self.say(&render::argument_hint("arguments", &required))
                    .await?;
                self.mode = Mode::AwaitingArguments(PendingCommand::CallTool(tool));
                Ok(())
            }
            Command::Prompt(None) => {
                self.say("Please specify a prompt name. Usage: prompt <prompt_name>")
                    .await
            }
            Command::Prompt(Some(name)) => {
                let required: Vec<String> = {
                    let session = self.session.lock().await;
                    session
                        .remote()
                        .and_then(|remote| remote.prompt(&name))
                        .map(|descriptor| {
                            descriptor.required_arguments().map(str::to_string).collect()
                        })
                        .unwrap_or_default()
                };
                self.say(&render::argument_hint("prompt arguments", &required))
                    .await?;
                self.mode = Mode::AwaitingArguments(PendingCommand::GetPrompt(name));
                Ok(())
            }
            Command::Exit => self.close(ShutdownReason::ExitCommand).await,
            Command::Unknown(word) => {
                self.say(&format!(
                    "Unknown command: {}. Type \"help\" for available commands.",
                    word
                ))
                .await
            }
        }
    }

    /// Finish a pending `call` or `prompt` with its arguments line
    async fn complete(&mut self, pending: PendingCommand, line: &str) -> Result<()> {
        let arguments = match parse_arguments(line) {
            Ok(arguments) => arguments,
            Err(e) => return self.say(&format!("❌ {}", e)).await,
        };

        let text = match pending {
            PendingCommand::CallTool(tool) => {
                self.say(&format!("\n🚀 Calling tool: {}", tool)).await?;
                let called = self.session.lock().await.call_tool(&tool, arguments).await;
                match called {
                    Ok(result) => render::tool_result(&result),
                    Err(e) => render::failure(Operation::CallTool(&tool), &e),
                }
            }
            PendingCommand::GetPrompt(name) => {
                self.say(&format!("\n📝 Getting prompt: {}", name)).await?;
                let rendered = self.session.lock().await.get_prompt(&name, arguments).await;
                match rendered {
                    Ok(result) => render::prompt_result(&result),
                    Err(e) => render::failure(Operation::GetPrompt, &e),
                }
            }
        };

        self.say(&text).await
    }

    /// Enter `Closed`: release the input, run (or wait for) the teardown
    async fn close(&mut self, reason: ShutdownReason) -> Result<()> {
        if self.mode == Mode::Closed {
            return Ok(());
        }
        self.mode = Mode::Closed;
        // Dropping the reader releases stdin; this is the only place it happens
        drop(self.input.take());

        if self.coordinator.is_closing() {
            if let Some(ShutdownReason::Signal(name)) = self.coordinator.reason() {
                self.say(&format!("\n🛑 Received {}, shutting down gracefully...", name))
                    .await?;
            }
            self.say("\n👋 Disconnecting from MCP server...").await?;
            self.coordinator.completed().await;
        } else {
            self.say("\n👋 Disconnecting from MCP server...").await?;
            self.coordinator.shutdown(reason).await;
        }

        self.say("✅ Disconnected successfully").await
    }
}

/// Arguments line of a pending invocation: empty means `{}`, anything else
/// must be a JSON object
pub fn parse_arguments(line: &str) -> Result<Map<String, Value>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(line)? {
        Value::Object(arguments) => Ok(arguments),
        _ => Err(ClientError::Parse(<serde_json::Error as serde::de::Error>::custom(
            "expected a JSON object",
        ))),
    }
}
