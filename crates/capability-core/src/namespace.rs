//! Capability namespaces

use serde::{Deserialize, Serialize};

/// One of the three independent capability kinds.
///
/// Names are unique only within a namespace: a tool and a prompt may share
/// a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Tools,
    Resources,
    Prompts,
}

impl Namespace {
    pub const ALL: [Namespace; 3] = [Namespace::Tools, Namespace::Resources, Namespace::Prompts];

    /// Singular noun for messages ("tool", "resource", "prompt")
    pub fn singular(&self) -> &'static str {
        match self {
            Namespace::Tools => "tool",
            Namespace::Resources => "resource",
            Namespace::Prompts => "prompt",
        }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Namespace::Tools => f.write_str("tools"),
            Namespace::Resources => f.write_str("resources"),
            Namespace::Prompts => f.write_str("prompts"),
        }
    }
}
