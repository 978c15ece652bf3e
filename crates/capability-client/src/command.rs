//! Interactive command parsing

/// A line typed at the `mcp> ` prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Tools,
    /// `call <tool>`; `None` when the tool name is missing
    Call(Option<String>),
    Resources,
    /// `read <uri>`; the URI is the rest of the line and may contain spaces
    Read(Option<String>),
    Prompts,
    /// `prompt <name>`
    Prompt(Option<String>),
    Exit,
    Unknown(String),
    Empty,
}

impl Command {
    /// Parse one input line. The command word is case-insensitive.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let target = || rest.split_whitespace().next().map(str::to_string);

        match word.to_lowercase().as_str() {
            "" => Self::Empty,
            "help" => Self::Help,
            "tools" => Self::Tools,
            "call" => Self::Call(target()),
            "resources" => Self::Resources,
            "read" => Self::Read((!rest.is_empty()).then(|| rest.to_string())),
            "prompts" => Self::Prompts,
            "prompt" => Self::Prompt(target()),
            "exit" => Self::Exit,
            _ => Self::Unknown(word.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(Command::parse("help"), Command::Help);
        assert_eq!(Command::parse("  TOOLS  "), Command::Tools);
        assert_eq!(Command::parse("Exit"), Command::Exit);
        assert_eq!(Command::parse(""), Command::Empty);
        assert_eq!(Command::parse("   "), Command::Empty);
    }

    #[test]
    fn test_call_takes_first_word_as_target() {
        assert_eq!(Command::parse("call add"), Command::Call(Some("add".to_string())));
        assert_eq!(
            Command::parse("call  add extra"),
            Command::Call(Some("add".to_string()))
        );
        assert_eq!(Command::parse("call"), Command::Call(None));
        assert_eq!(Command::parse("prompt"), Command::Prompt(None));
    }

    #[test]
    fn test_read_keeps_spaces_in_uri() {
        assert_eq!(
            Command::parse("read file:///my notes.txt "),
            Command::Read(Some("file:///my notes.txt".to_string()))
        );
        assert_eq!(Command::parse("read   "), Command::Read(None));
    }

    #[test]
    fn test_unknown_keeps_original_word() {
        assert_eq!(Command::parse("Frobnicate now"), Command::Unknown("Frobnicate".to_string()));
    }
}
