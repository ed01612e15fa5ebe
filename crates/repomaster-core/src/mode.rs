//! Launch modes
//!
//! The web dashboard (`frontend`) and the four agent modes behind `backend`.
//! Wire names are the exact strings accepted on the command line and passed
//! to the agent runtime.

use crate::error::Error;
use std::fmt;
use std::str::FromStr;

/// Top-level launch mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaunchMode {
    /// Streamlit web dashboard
    Frontend,
    /// One of the CLI agent modes
    Backend,
}

impl LaunchMode {
    /// Accepted names
    pub const NAMES: &'static [&'static str] = &["frontend", "backend"];

    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Frontend => "frontend",
            Self::Backend => "backend",
        }
    }
}

impl fmt::Display for LaunchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LaunchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "frontend" => Ok(Self::Frontend),
            "backend" => Ok(Self::Backend),
            other => Err(Error::UnknownMode {
                kind: "launch",
                value: other.to_string(),
            }),
        }
    }
}

/// Agent mode run by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendMode {
    /// Multi-agent orchestration that routes tasks to the other agents
    Unified,
    /// Repository search and analysis
    DeepSearch,
    /// Programming and development assistance
    GeneralAssistant,
    /// Repository exploration and understanding
    RepositoryAgent,
}

impl BackendMode {
    /// Every mode, in menu order
    pub const ALL: [BackendMode; 4] = [
        Self::Unified,
        Self::DeepSearch,
        Self::GeneralAssistant,
        Self::RepositoryAgent,
    ];

    /// Accepted names, in menu order
    pub const NAMES: &'static [&'static str] =
        &["unified", "deepsearch", "general_assistant", "repository_agent"];

    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unified => "unified",
            Self::DeepSearch => "deepsearch",
            Self::GeneralAssistant => "general_assistant",
            Self::RepositoryAgent => "repository_agent",
        }
    }

    /// Human-readable name
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Unified => "Unified AI Assistant",
            Self::DeepSearch => "Deep Search Agent",
            Self::GeneralAssistant => "General Assistant",
            Self::RepositoryAgent => "Repository Agent",
        }
    }

    /// One-line description for menus
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Unified => "Intelligent multi-agent orchestration",
            Self::DeepSearch => "Specialized repository search and analysis",
            Self::GeneralAssistant => "Programming and development assistance",
            Self::RepositoryAgent => "Repository exploration and understanding",
        }
    }
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| Error::UnknownMode {
                kind: "backend",
                value: s.to_string(),
            })
    }
}
