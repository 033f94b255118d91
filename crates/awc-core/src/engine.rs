//! The closed set of agent engines (spec §4.5 C5).
//!
//! Modeled as a data enum rather than trait objects, matching the teacher's
//! `Executor` pattern (a fixed, small, closed set of implementations gets a
//! tagged enum, not `dyn Trait`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineId {
    Copilot,
    CopilotSdk,
    Claude,
    Codex,
    Custom,
}

impl EngineId {
    pub const ALL: [EngineId; 5] = [
        EngineId::Copilot,
        EngineId::CopilotSdk,
        EngineId::Claude,
        EngineId::Codex,
        EngineId::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineId::Copilot => "copilot",
            EngineId::CopilotSdk => "copilot-sdk",
            EngineId::Claude => "claude",
            EngineId::Codex => "codex",
            EngineId::Custom => "custom",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            EngineId::Copilot => "GitHub Copilot CLI",
            EngineId::CopilotSdk => "GitHub Copilot SDK",
            EngineId::Claude => "Claude Code",
            EngineId::Codex => "OpenAI Codex",
            EngineId::Custom => "Custom engine",
        }
    }

    pub fn experimental(&self) -> bool {
        matches!(self, EngineId::CopilotSdk | EngineId::Custom)
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EngineId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "copilot" => Ok(EngineId::Copilot),
            "copilot-sdk" | "copilotsdk" => Ok(EngineId::CopilotSdk),
            "claude" | "claude-code" => Ok(EngineId::Claude),
            "codex" => Ok(EngineId::Codex),
            "custom" => Ok(EngineId::Custom),
            other => Err(format!("unknown engine id '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for id in EngineId::ALL {
            assert_eq!(id, id.as_str().parse().unwrap());
        }
    }

    #[test]
    fn unknown_engine_is_rejected() {
        assert!("nonexistent".parse::<EngineId>().is_err());
    }
}
