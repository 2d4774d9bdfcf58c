use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Analysis mode selecting the prompt template and the response formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Free-form questions about the codebase
    #[default]
    CodebaseQa,
    /// Low-level design plan for a requested feature
    LowLevelDesign,
    /// Implementation of a requested task
    CodeGeneration,
    /// Impact analysis of the loaded branch against the default branch
    ChangeAnalysis,
}

impl AgentKind {
    pub const ALL: [AgentKind; 4] = [
        Self::CodebaseQa,
        Self::LowLevelDesign,
        Self::CodeGeneration,
        Self::ChangeAnalysis,
    ];

    /// Human-readable name shown in agent pickers.
    pub fn label(self) -> &'static str {
        match self {
            Self::CodebaseQa => "Codebase Q&A",
            Self::LowLevelDesign => "Low-Level Design",
            Self::CodeGeneration => "Code Generation",
            Self::ChangeAnalysis => "Code Changes",
        }
    }

    /// Hint for the chat input box.
    pub fn input_placeholder(self) -> &'static str {
        match self {
            Self::CodebaseQa => "Ask about the codebase...",
            Self::LowLevelDesign => "Describe the feature to design...",
            Self::CodeGeneration => "Describe the feature/bug to implement...",
            Self::ChangeAnalysis => "Analyze changes (automatic)",
        }
    }

    /// Whether a turn with this agent needs the default-branch snapshot.
    pub fn needs_reference(self) -> bool {
        matches!(self, Self::ChangeAnalysis)
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CodebaseQa => write!(f, "qa"),
            Self::LowLevelDesign => write!(f, "lld"),
            Self::CodeGeneration => write!(f, "codegen"),
            Self::ChangeAnalysis => write!(f, "changes"),
        }
    }
}

impl FromStr for AgentKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "qa" | "q&a" | "codebase-q&a" | "codebase-qa" => Ok(Self::CodebaseQa),
            "lld" | "low-level-design" | "design" => Ok(Self::LowLevelDesign),
            "codegen" | "code-generation" | "generate" => Ok(Self::CodeGeneration),
            "changes" | "code-changes" | "change-analysis" => Ok(Self::ChangeAnalysis),
            _ => Err(format!("unknown agent '{s}'")),
        }
    }
}
