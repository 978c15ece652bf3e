//! JSON-RPC method names understood by capability servers

use crate::namespace::Namespace;

/// A JSON-RPC method a capability server answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Initialize,
    Ping,
    /// `tools/list`, `resources/list`, `prompts/list`
    List(Namespace),
    /// `tools/call`, `resources/read`, `prompts/get`
    Invoke(Namespace),
}

impl Method {
    /// Parse a wire method name; unknown names yield `None`
    pub fn parse(method: &str) -> Option<Self> {
        let parsed = match method {
            "initialize" => Self::Initialize,
            "ping" => Self::Ping,
            "tools/list" => Self::List(Namespace::Tools),
            "resources/list" => Self::List(Namespace::Resources),
            "prompts/list" => Self::List(Namespace::Prompts),
            "tools/call" => Self::Invoke(Namespace::Tools),
            "resources/read" => Self::Invoke(Namespace::Resources),
            "prompts/get" => Self::Invoke(Namespace::Prompts),
            _ => return None,
        };
        Some(parsed)
    }

    /// Wire name of the method
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Ping => "ping",
            Self::List(Namespace::Tools) => "tools/list",
            Self::List(Namespace::Resources) => "resources/list",
            Self::List(Namespace::Prompts) => "prompts/list",
            Self::Invoke(Namespace::Tools) => "tools/call",
            Self::Invoke(Namespace::Resources) => "resources/read",
            Self::Invoke(Namespace::Prompts) => "prompts/get",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_matches_wire_names() {
        for method in [
            Method::Initialize,
            Method::Ping,
            Method::List(Namespace::Tools),
            Method::List(Namespace::Resources),
            Method::List(Namespace::Prompts),
            Method::Invoke(Namespace::Tools),
            Method::Invoke(Namespace::Resources),
            Method::Invoke(Namespace::Prompts),
        ] {
            assert_eq!(Method::parse(method.as_str()), Some(method));
        }
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(Method::parse("resources/subscribe"), None);
        assert_eq!(Method::parse(""), None);
    }
}
