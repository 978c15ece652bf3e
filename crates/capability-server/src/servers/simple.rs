//! Simple server: arithmetic, echo and clock tools, two sample resources and
//! three prompt templates

use chrono::Local;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::time::Instant;

use super::{arg, number_arg, string_arg};
use capability_core::protocol::{
    GetPromptResult, McpInputSchema, McpPrompt, McpResource, McpTool, PromptMessage,
    ResourceContents, ToolCallResult,
};
use capability_core::{CapabilityRegistry, RegistryError};

const EXAMPLE_URI: &str = "file:///example.txt";
const SERVER_INFO_URI: &str = "config://server-info";

/// Build the simple server's registry
pub fn registry() -> Result<CapabilityRegistry, RegistryError> {
    let mut registry = CapabilityRegistry::new();

    let operands = || {
        McpInputSchema::default()
            .property("a", json!({"type": "number", "description": "First number"}), true)
            .property("b", json!({"type": "number", "description": "Second number"}), true)
    };

    registry.register_tool(
        McpTool::new("add", "Add two numbers together").with_schema(operands()),
        add,
    )?;
    registry.register_tool(
        McpTool::new("multiply", "Multiply two numbers").with_schema(operands()),
        multiply,
    )?;
    registry.register_tool(
        McpTool::new("echo", "Echo back the input message").with_schema(
            McpInputSchema::default().property(
                "message",
                json!({"type": "string", "description": "Message to echo"}),
                true,
            ),
        ),
        echo,
    )?;
    registry.register_tool(
        McpTool::new("current-time", "Get the current date and time"),
        current_time,
    )?;

    registry.register_resource(
        McpResource::new(EXAMPLE_URI, "Example Text File")
            .with_description("A sample text resource")
            .with_mime_type("text/plain"),
        |uri: String| async move {
            Ok::<_, anyhow::Error>(vec![ResourceContents::text(uri, "text/plain", example_text())])
        },
    )?;

    let started = Instant::now();
    registry.register_resource(
        McpResource::new(SERVER_INFO_URI, "Server Information")
            .with_description("Information about this server")
            .with_mime_type("application/json"),
        move |uri: String| async move {
            let info = serde_json::to_string_pretty(&server_info(started))?;
            Ok::<_, anyhow::Error>(vec![ResourceContents::text(uri, "application/json", info)])
        },
    )?;

    registry.register_prompt(
        McpPrompt::new("code_review", "Template for conducting code reviews")
            .argument("code", "The code to review", true)
            .argument("language", "Programming language", false),
        code_review,
    )?;
    registry.register_prompt(
        McpPrompt::new("email_template", "Professional email template")
            .argument("recipient", "Email recipient", true)
            .argument("subject", "Email subject", true)
            .argument("tone", "Email tone (formal/casual)", false),
        email_template,
    )?;
    registry.register_prompt(
        McpPrompt::new("bug_report", "Bug report template")
            .argument("title", "Bug title", true)
            .argument("severity", "Bug severity level", false),
        bug_report,
    )?;

    Ok(registry)
}

async fn add(args: Map<String, Value>) -> anyhow::Result<ToolCallResult> {
    let a = number_arg(&args, "a")?;
    let b = number_arg(&args, "b")?;
    Ok(ToolCallResult::text(format!("The sum of {} and {} is {}", a, b, a + b)))
}

async fn multiply(args: Map<String, Value>) -> anyhow::Result<ToolCallResult> {
    let a = number_arg(&args, "a")?;
    let b = number_arg(&args, "b")?;
    Ok(ToolCallResult::text(format!("The product of {} and {} is {}", a, b, a * b)))
}

async fn echo(args: Map<String, Value>) -> anyhow::Result<ToolCallResult> {
    let message = string_arg(&args, "message")?;
    Ok(ToolCallResult::text(format!("Echo: {}", message)))
}

async fn current_time(_args: Map<String, Value>) -> anyhow::Result<ToolCallResult> {
    let now = Local::now().format("%Y-%m-%d %H:%M:%S %:z");
    Ok(ToolCallResult::text(format!("Current time: {}", now)))
}

fn example_text() -> String {
    format!(
        "Hello! This is a sample file.\n\n\
         It contains:\n\
         - Sample text that demonstrates resources\n\
         - Notes on how the protocol works\n\
         - Data you can read from the client\n\n\
         Generated at: {}\n\
         Server: simple-capability-server v{}\n",
        Local::now().to_rfc3339(),
        env!("CARGO_PKG_VERSION")
    )
}

fn server_info(started: Instant) -> Value {
    json!({
        "serverName": "simple-capability-server",
        "version": env!("CARGO_PKG_VERSION"),
        "capabilities": ["tools", "resources", "prompts"],
        "toolsCount": 4,
        "resourcesCount": 2,
        "status": "running",
        "uptimeSecs": started.elapsed().as_secs_f64(),
        "platform": std::env::consts::OS,
        "availableTools": ["add", "multiply", "echo", "current-time"],
        "availableResources": [EXAMPLE_URI, SERVER_INFO_URI],
    })
}

async fn code_review(args: BTreeMap<String, String>) -> anyhow::Result<GetPromptResult> {
    let language = arg(&args, "language").unwrap_or("unknown");
    let code = arg(&args, "code").unwrap_or_default();

    let text = format!(
        "Please review the following {language} code and cover:\n\n\
         1. Quality: logic problems, likely bugs, performance issues\n\
         2. Security: potential vulnerabilities, missing validation\n\
         3. Conventions: readability, maintainability, recommended patterns\n\
         4. Testing: suggested test cases and coverage\n\n\
         Code to review:\n```{language}\n{code}\n```\n\n\
         Be specific in your recommendations."
    );

    Ok(GetPromptResult::new(
        Some(format!("Code review template for {}", language)),
        vec![PromptMessage::user(text)],
    ))
}

async fn email_template(args: BTreeMap<String, String>) -> anyhow::Result<GetPromptResult> {
    let recipient = arg(&args, "recipient").unwrap_or_default();
    let subject = arg(&args, "subject").unwrap_or_default();
    let tone = arg(&args, "tone").unwrap_or("formal");

    let text = format!(
        "Write a professional email with these details:\n\n\
         Recipient: {recipient}\n\
         Subject: {subject}\n\
         Tone: {tone}\n\n\
         Structure: greeting, context, main message, call to action if any, \
         professional closing, signature.\n\
         Keep a {tone} tone and be clear and concise.\n\n\
         Write the complete email."
    );

    Ok(GetPromptResult::new(
        Some(format!("Professional email template ({} tone)", tone)),
        vec![PromptMessage::user(text)],
    ))
}

async fn bug_report(args: BTreeMap<String, String>) -> anyhow::Result<GetPromptResult> {
    let title = arg(&args, "title").unwrap_or_default();
    let severity = arg(&args, "severity").unwrap_or("medium");

    let text = format!(
        "Write a detailed bug report with the following information:\n\n\
         Title: {title}\n\
         Severity: {severity}\n\n\
         ## Description\n\
         ## Steps to Reproduce\n\
         ## Expected Behavior\n\
         ## Actual Behavior\n\
         ## Environment\n\
         ## Evidence\n\
         ## Additional Information\n\n\
         Fill in every section with specific details."
    );

    Ok(GetPromptResult::new(
        Some(format!("Bug report template for: {}", title)),
        vec![PromptMessage::user(text)],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use capability_core::{Content, Namespace, RequestRouter, RouterError};
    use std::sync::Arc;

    fn router() -> RequestRouter {
        RequestRouter::new(Arc::new(registry().unwrap()))
    }

    fn tool_text(content: Content) -> String {
        match content {
            Content::Tool(result) => result.content[0].as_text().unwrap_or_default().to_string(),
            other => panic!("expected tool content, got {other:?}"),
        }
    }

    #[test]
    fn test_registry_contents() {
        let registry = registry().unwrap();
        assert_eq!(registry.len(Namespace::Tools), 4);
        assert_eq!(registry.len(Namespace::Resources), 2);
        assert_eq!(registry.len(Namespace::Prompts), 3);
    }

    #[tokio::test]
    async fn test_add_and_multiply() {
        let router = router();

        let sum = router
            .handle(Namespace::Tools, "add", json!({"a": 2, "b": 3}))
            .await
            .unwrap();
        assert_eq!(tool_text(sum), "The sum of 2 and 3 is 5");

        let product = router
            .handle(Namespace::Tools, "multiply", json!({"a": 1.5, "b": 4}))
            .await
            .unwrap();
        assert_eq!(tool_text(product), "The product of 1.5 and 4 is 6");
    }

    #[tokio::test]
    async fn test_non_numeric_operand_is_invalid_params() {
        let err = router()
            .handle(Namespace::Tools, "add", json!({"a": "two", "b": 3}))
            .await
            .unwrap_err();
        assert!(matches!(err, RouterError::InvalidParams(_)), "{err}");
    }

    #[tokio::test]
    async fn test_current_time_needs_no_arguments() {
        let content = router()
            .handle(Namespace::Tools, "current-time", Value::Null)
            .await
            .unwrap();
        assert!(tool_text(content).starts_with("Current time: "));
    }

    #[tokio::test]
    async fn test_server_info_resource_is_json() {
        let content = router()
            .handle(Namespace::Resources, SERVER_INFO_URI, Value::Null)
            .await
            .unwrap();
        let Content::Resource(result) = content else {
            panic!("expected resource content");
        };

        let text = result.contents[0].text.as_deref().unwrap();
        let info: Value = serde_json::from_str(text).unwrap();
        assert_eq!(info["toolsCount"], 4);
        assert_eq!(result.contents[0].mime_type.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_email_template_defaults_tone() {
        let content = router()
            .handle(
                Namespace::Prompts,
                "email_template",
                json!({"recipient": "ops@example.com", "subject": "Outage"}),
            )
            .await
            .unwrap();
        let Content::Prompt(result) = content else {
            panic!("expected prompt content");
        };
        assert_eq!(
            result.description.as_deref(),
            Some("Professional email template (formal tone)")
        );
    }
}
