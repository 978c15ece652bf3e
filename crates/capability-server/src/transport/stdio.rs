//! stdio transport for MCP (used when a client spawns the server)

use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use crate::handler::RequestHandler;
use crate::ServerError;
use capability_core::protocol::{McpError, McpMessage};

/// stdio transport for MCP protocol
pub struct StdioTransport {
    handler: Arc<RequestHandler>,
}

impl StdioTransport {
    /// Create a new stdio transport
    pub fn new(handler: Arc<RequestHandler>) -> Self {
        Self { handler }
    }

    /// Run the stdio transport until stdin reaches EOF
    pub async fn run(&self) -> Result<(), ServerError> {
        info!("Starting MCP server on stdio");

        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve newline-delimited JSON-RPC messages from `reader`, writing
    /// responses to `writer`
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<(), ServerError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut frame = Vec::new();

        loop {
            frame.clear();

            let bytes_read = reader.read_until(b'\n', &mut frame).await?;
            if bytes_read == 0 {
                info!("EOF received, shutting down");
                break;
            }

            let line = match std::str::from_utf8(&frame) {
                Ok(line) => line.trim(),
                Err(e) => {
                    error!("Received a frame that is not UTF-8: {}", e);
                    let error_response = McpMessage::error_response(None, McpError::parse_error());
                    write_message(&mut writer, &error_response).await?;
                    continue;
                }
            };
            if line.is_empty() {
                continue;
            }

            debug!("Received: {}", line);

            let message: McpMessage = match serde_json::from_str(line) {
                Ok(msg) => msg,
                Err(e) => {
                    error!("Failed to parse message: {}", e);
                    let error_response = McpMessage::error_response(None, McpError::parse_error());
                    write_message(&mut writer, &error_response).await?;
                    continue;
                }
            };

            if let Some(response) = self.handler.handle(message).await {
                write_message(&mut writer, &response).await?;
            }
        }

        Ok(())
    }
}

async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    message: &McpMessage,
) -> Result<(), ServerError> {
    let response_line = serde_json::to_string(message)?;
    debug!("Sending: {}", response_line);
    writer.write_all(response_line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::servers::simple;
    use capability_core::protocol::ServerInfo;
    use capability_core::RequestRouter;

    fn transport() -> StdioTransport {
        let router = RequestRouter::new(Arc::new(simple::registry().unwrap()));
        let handler = RequestHandler::new(
            router,
            ServerInfo {
                name: "test".to_string(),
                version: "0.0.0".to_string(),
            },
        );
        StdioTransport::new(Arc::new(handler))
    }

    #[tokio::test]
    async fn test_serves_one_response_per_request() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"echo","arguments":{"message":"hi"}}}"#,
            "\n",
        );
        let mut output = Vec::new();

        transport()
            .serve(BufReader::new(input.as_bytes()), &mut output)
            .await
            .unwrap();

        let lines: Vec<McpMessage> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].id, Some(serde_json::json!(1)));
        assert_eq!(lines[1].result.as_ref().unwrap()["content"][0]["text"], "Echo: hi");
    }

    #[tokio::test]
    async fn test_malformed_line_yields_parse_error() {
        let mut output = Vec::new();

        transport()
            .serve(BufReader::new("{not json\n".as_bytes()), &mut output)
            .await
            .unwrap();

        let response: McpMessage =
            serde_json::from_str(String::from_utf8(output).unwrap().trim()).unwrap();
        assert_eq!(response.error.unwrap().code, McpError::PARSE_ERROR);
        assert!(response.id.is_none());
    }

    #[tokio::test]
    async fn test_undecodable_frame_yields_parse_error_and_serving_continues() {
        let mut input = b"\xff\xfe\n".to_vec();
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#);
        input.push(b'\n');
        let mut output = Vec::new();

        transport()
            .serve(BufReader::new(input.as_slice()), &mut output)
            .await
            .unwrap();

        let lines: Vec<McpMessage> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].error.as_ref().unwrap().code, McpError::PARSE_ERROR);
        assert_eq!(lines[1].id, Some(serde_json::json!(7)));
    }
}
