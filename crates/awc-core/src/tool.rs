//! Declared tool configuration (spec §3 `ToolConfig`).

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

pub type ToolMap = IndexMap<String, ToolConfig>;

/// A declared tool, tagged by kind. Mirrors the teacher's tagged-enum
/// transport pattern (`csa_config::mcp::McpTransport`): one variant per
/// closed alternative, `#[serde(tag = "...")]`-free here because the tool
/// *name* (the map key) already carries the discriminant for most kinds;
/// `Mcp` is the one kind that needs internal tagging for its transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolConfig {
    Bash(BashConfig),
    Edit(EditConfig),
    GitHub(GitHubToolConfig),
    WebFetch(SimpleToggle),
    WebSearch(SimpleToggle),
    Mcp(McpToolConfig),
}

/// `tools.bash`: either `["*"]` (wildcard, "all commands") or an explicit
/// allowlist of command names, each optionally paired with a shell-command
/// allowlist (`shell(cmd)` granular form, spec §4.9). The bare-sequence form
/// (`bash: ["*"]`, `bash: [ls, cat]`) is the common shorthand on the wire;
/// the `{commands, wildcard}` mapping is the fully-spelled-out form produced
/// by re-serializing a merged config.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct BashConfig {
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub wildcard: bool,
}

impl<'de> Deserialize<'de> for BashConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shorthand {
            List(Vec<String>),
            Full {
                #[serde(default)]
                commands: Vec<String>,
                #[serde(default)]
                wildcard: bool,
            },
        }

        match Shorthand::deserialize(deserializer)? {
            Shorthand::List(commands) if commands == ["*"] => Ok(BashConfig::wildcard()),
            Shorthand::List(commands) => Ok(BashConfig {
                commands,
                wildcard: false,
            }),
            Shorthand::Full { commands, wildcard } => Ok(BashConfig { commands, wildcard }),
        }
    }
}

impl BashConfig {
    pub fn wildcard() -> Self {
        Self {
            commands: Vec::new(),
            wildcard: true,
        }
    }

    /// Union two bash command allowlists (spec §4.3 `tools` merge rule:
    /// "bash command lists union"). Wildcard absorbs everything.
    pub fn union(&self, other: &BashConfig) -> BashConfig {
        if self.wildcard || other.wildcard {
            return BashConfig::wildcard();
        }
        let mut seen = IndexSet::new();
        for c in self.commands.iter().chain(other.commands.iter()) {
            seen.insert(c.clone());
        }
        BashConfig {
            commands: seen.into_iter().collect(),
            wildcard: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EditConfig {
    #[serde(default)]
    pub write: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SimpleToggle {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GitHubToolset {
    Default,
    Repos,
    Issues,
    PullRequests,
    Discussions,
    Actions,
    Projects,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GitHubToolConfig {
    #[serde(default)]
    pub toolsets: Vec<GitHubToolset>,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub custom_token: Option<String>,
    #[serde(default)]
    pub lockdown: bool,
}

/// MCP transport kinds (spec §4.8). Tagged exactly like the teacher's
/// `McpTransport` enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum McpTransportConfig {
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: IndexMap<String, String>,
    },
    Http {
        url: String,
        #[serde(default)]
        headers: IndexMap<String, String>,
    },
    Docker {
        image: String,
        #[serde(default)]
        mounts: Vec<String>,
        #[serde(default)]
        network: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpToolConfig {
    #[serde(flatten)]
    pub transport: McpTransportConfig,
    #[serde(default)]
    pub startup_timeout_secs: Option<u64>,
    #[serde(default)]
    pub tool_timeout_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_absorbs_explicit_commands() {
        let a = BashConfig::wildcard();
        let b = BashConfig {
            commands: vec!["ls".into()],
            wildcard: false,
        };
        let merged = a.union(&b);
        assert!(merged.wildcard);
        assert!(merged.commands.is_empty());
    }

    #[test]
    fn bare_wildcard_sequence_deserializes_to_wildcard() {
        let cfg: BashConfig = serde_yaml::from_str("[\"*\"]").unwrap();
        assert_eq!(cfg, BashConfig::wildcard());
    }

    #[test]
    fn bare_command_sequence_deserializes_to_explicit_allowlist() {
        let cfg: BashConfig = serde_yaml::from_str("[ls, cat]").unwrap();
        assert_eq!(
            cfg,
            BashConfig {
                commands: vec!["ls".into(), "cat".into()],
                wildcard: false,
            }
        );
    }

    #[test]
    fn mapping_form_still_deserializes() {
        let cfg: BashConfig = serde_yaml::from_str("wildcard: true\n").unwrap();
        assert_eq!(cfg, BashConfig::wildcard());
    }

    #[test]
    fn tool_map_accepts_bash_shorthand_sequence() {
        let tools: ToolMap = serde_yaml::from_str("bash: [\"*\"]\n").unwrap();
        match tools.get("bash") {
            Some(ToolConfig::Bash(cfg)) => assert!(cfg.wildcard),
            other => panic!("expected Bash(wildcard), got {other:?}"),
        }
    }

    #[test]
    fn union_dedupes_preserving_first_occurrence() {
        let a = BashConfig {
            commands: vec!["ls".into(), "cat".into()],
            wildcard: false,
        };
        let b = BashConfig {
            commands: vec!["cat".into(), "grep".into()],
            wildcard: false,
        };
        let merged = a.union(&b);
        assert_eq!(merged.commands, vec!["ls", "cat", "grep"]);
    }
}
