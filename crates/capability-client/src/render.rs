//! Text rendering of listings, results and errors for the interactive loop

use serde_json::Value;

use crate::error::ClientError;
use capability_core::protocol::{
    ContentBlock, GetPromptResult, McpPrompt, McpResource, McpTool, ReadResourceResult,
    ToolCallResult,
};

pub const HELP: &str = "\
Available commands:
  help          - Show this help message
  tools         - List available tools
  call <tool>   - Call a specific tool (you'll be prompted for arguments)
  resources     - List available resources
  read <uri>    - Read a specific resource by URI
  prompts       - List available prompts
  prompt <name> - Get a specific prompt (you'll be prompted for arguments)
  exit          - Exit interactive mode";

/// A remote operation, used to word failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation<'a> {
    ListTools,
    CallTool(&'a str),
    ListResources,
    ReadResource,
    ListPrompts,
    GetPrompt,
}

impl Operation<'_> {
    /// Message shown when the server answers `-32601`
    fn unsupported(&self) -> Option<&'static str> {
        match self {
            Operation::ListResources => Some("📂 This server does not support resource listing."),
            Operation::ReadResource => Some("📖 This server does not support resource reading."),
            Operation::ListPrompts => Some("💬 This server does not support prompt listing."),
            Operation::GetPrompt => Some("📝 This server does not support prompt requests."),
            Operation::ListTools | Operation::CallTool(_) => None,
        }
    }
}

impl std::fmt::Display for Operation<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::ListTools => f.write_str("list tools"),
            Operation::CallTool(name) => write!(f, "call tool {}", name),
            Operation::ListResources => f.write_str("list resources"),
            Operation::ReadResource => f.write_str("read resource"),
            Operation::ListPrompts => f.write_str("list prompts"),
            Operation::GetPrompt => f.write_str("get prompt"),
        }
    }
}

/// One-line description of a failed operation
pub fn failure(operation: Operation<'_>, err: &ClientError) -> String {
    if err.is_method_not_found() {
        if let Some(message) = operation.unsupported() {
            return message.to_string();
        }
    }
    one_line(&format!("❌ Failed to {}: {}", operation, err))
}

fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

pub fn tools(tools: &[McpTool]) -> String {
    if tools.is_empty() {
        return "No tools available on this server.".to_string();
    }

    let mut lines = vec![format!("Found {} tools:", tools.len())];
    for (index, tool) in tools.iter().enumerate() {
        lines.push(String::new());
        lines.push(format!("{}. {}", index + 1, tool.name));
        lines.push(format!(
            "   Description: {}",
            tool.description.as_deref().unwrap_or("No description")
        ));
        if let Ok(schema) = serde_json::to_value(&tool.input_schema) {
            lines.push(format!("   Input Schema: {}", pretty(&schema)));
        }
    }
    lines.join("\n")
}

pub fn resources(resources: &[McpResource]) -> String {
    if resources.is_empty() {
        return "No resources available on this server.".to_string();
    }

    let mut lines = vec![format!("Found {} resources:", resources.len())];
    for (index, resource) in resources.iter().enumerate() {
        lines.push(String::new());
        lines.push(format!("{}. {}", index + 1, resource.uri));
        lines.push(format!("   Name: {}", resource.name));
        lines.push(format!(
            "   Description: {}",
            resource.description.as_deref().unwrap_or("No description")
        ));
        lines.push(format!(
            "   MIME Type: {}",
            resource.mime_type.as_deref().unwrap_or("Unknown")
        ));
    }
    lines.join("\n")
}

pub fn prompts(prompts: &[McpPrompt]) -> String {
    if prompts.is_empty() {
        return "No prompts available on this server.".to_string();
    }

    let mut lines = vec![format!("Found {} prompts:", prompts.len())];
    for (index, prompt) in prompts.iter().enumerate() {
        lines.push(String::new());
        lines.push(format!("{}. {}", index + 1, prompt.name));
        lines.push(format!(
            "   Description: {}",
            prompt.description.as_deref().unwrap_or("No description")
        ));
        if !prompt.arguments.is_empty() {
            lines.push("   Arguments:".to_string());
            for arg in &prompt.arguments {
                let required = if arg.required { "required" } else { "optional" };
                lines.push(format!(
                    "     - {} ({}): {}",
                    arg.name,
                    required,
                    arg.description.as_deref().unwrap_or("No description")
                ));
            }
        }
    }
    lines.join("\n")
}

fn content_block(block: &ContentBlock) -> String {
    match block {
        ContentBlock::Text { text } => text.clone(),
        ContentBlock::Image { mime_type, data } => {
            format!("[image {} - {} bytes base64]", mime_type, data.len())
        }
        ContentBlock::Resource { resource } => resource
            .text
            .clone()
            .unwrap_or_else(|| format!("[resource {}]", resource.uri)),
    }
}

pub fn tool_result(result: &ToolCallResult) -> String {
    let header = if result.is_error == Some(true) {
        "⚠️  Tool reported an error:"
    } else {
        "📤 Tool response:"
    };

    let mut lines = vec![header.to_string()];
    lines.extend(result.content.iter().map(content_block));
    lines.join("\n")
}

pub fn resource_contents(result: &ReadResourceResult) -> String {
    if result.contents.is_empty() {
        return "No content found for this resource.".to_string();
    }

    let mut lines = Vec::new();
    for (index, content) in result.contents.iter().enumerate() {
        if index > 0 {
            lines.push(String::new());
        }
        lines.push(format!("--- Content {} ---", index + 1));
        lines.push(format!("URI: {}", content.uri));
        lines.push(format!(
            "MIME Type: {}",
            content.mime_type.as_deref().unwrap_or("Unknown")
        ));
        lines.push(String::new());
        lines.push(
            content
                .text
                .clone()
                .or_else(|| content.blob.clone())
                .unwrap_or_else(|| "No content".to_string()),
        );
    }
    lines.join("\n")
}

pub fn prompt_result(result: &GetPromptResult) -> String {
    let mut lines = Vec::new();
    if let Some(description) = &result.description {
        lines.push(format!("Description: {}", description));
    }

    if result.messages.is_empty() {
        lines.push("No prompt content available.".to_string());
        return lines.join("\n");
    }

    lines.push(String::new());
    lines.push("--- Prompt Content ---".to_string());
    for (index, message) in result.messages.iter().enumerate() {
        lines.push(String::new());
        lines.push(format!("Message {} ({}):", index + 1, message.role));
        lines.push(content_block(&message.content));
    }
    lines.join("\n")
}

/// Hint printed before the `Args: ` sub-prompt. Required argument names come
/// from the cached descriptor when the server listed one.
pub fn argument_hint(label: &str, required: &[String]) -> String {
    let mut hint = format!("Enter {} as JSON (or press Enter for empty args):", label);
    if !required.is_empty() {
        hint.push_str(&format!("\n  required: {}", required.join(", ")));
    }
    hint
}

#[cfg(test)]
mod tests {
    use super::*;
    use capability_core::protocol::{McpInputSchema, PromptMessage, ResourceContents};
    use capability_core::RouterError;
    use serde_json::json;

    #[test]
    fn test_empty_listings() {
        assert_eq!(tools(&[]), "No tools available on this server.");
        assert_eq!(resources(&[]), "No resources available on this server.");
        assert_eq!(prompts(&[]), "No prompts available on this server.");
    }

    #[test]
    fn test_tool_listing_numbers_entries() {
        let listing = tools(&[
            McpTool::new("add", "Add two numbers").with_schema(
                McpInputSchema::default().property("a", json!({"type": "number"}), true),
            ),
            McpTool::new("echo", "Echo back the input message"),
        ]);

        assert!(listing.starts_with("Found 2 tools:"));
        assert!(listing.contains("1. add\n   Description: Add two numbers"));
        assert!(listing.contains("2. echo"));
        assert!(listing.contains("\"required\""));
    }

    #[test]
    fn test_prompt_listing_marks_required() {
        let listing = prompts(&[McpPrompt::new("bug_report", "Bug report template")
            .argument("title", "Bug title", true)
            .argument("severity", "How bad", false)]);

        assert!(listing.contains("- title (required): Bug title"));
        assert!(listing.contains("- severity (optional): How bad"));
    }

    #[test]
    fn test_method_not_found_is_unsupported() {
        let err = ClientError::from(RouterError::MethodNotFound("resources/list".to_string()));
        assert_eq!(
            failure(Operation::ListResources, &err),
            "📂 This server does not support resource listing."
        );

        let err = ClientError::from(RouterError::MethodNotFound("Unknown tool: nope".to_string()));
        assert_eq!(
            failure(Operation::CallTool("nope"), &err),
            "❌ Failed to call tool nope: Method not found: Unknown tool: nope"
        );
    }

    #[test]
    fn test_failure_is_single_line() {
        let err = ClientError::from(RouterError::Internal("line one\nline two".to_string()));
        let line = failure(Operation::GetPrompt, &err);
        assert!(!line.contains('\n'));
        assert!(line.ends_with("line one line two"));
    }

    #[test]
    fn test_results() {
        let result = tool_result(&ToolCallResult::text("The sum of 2 and 3 is 5"));
        assert_eq!(result, "📤 Tool response:\nThe sum of 2 and 3 is 5");

        let result = tool_result(&ToolCallResult::error("HTTP 401 - unauthorized"));
        assert!(result.starts_with("⚠️"));

        let contents = resource_contents(&ReadResourceResult {
            contents: vec![ResourceContents::text("file:///example.txt", "text/plain", "hi")],
        });
        assert!(contents.contains("URI: file:///example.txt"));
        assert!(contents.ends_with("\nhi"));

        let prompt = prompt_result(&GetPromptResult::new(
            Some("Bug report".to_string()),
            vec![PromptMessage::user("Describe the bug")],
        ));
        assert!(prompt.contains("Message 1 (user):\nDescribe the bug"));
    }

    #[test]
    fn test_argument_hint_lists_required() {
        assert_eq!(
            argument_hint("arguments", &[]),
            "Enter arguments as JSON (or press Enter for empty args):"
        );
        let hint = argument_hint("prompt arguments", &["title".to_string()]);
        assert!(hint.ends_with("required: title"));
    }
}
