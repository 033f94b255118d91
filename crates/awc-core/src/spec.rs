//! `WorkflowSpec` and `EngineConfig` (spec §3).

use crate::engine::EngineId;
use crate::network::{NetworkPolicy, SandboxConfig};
use crate::safe_outputs::SafeOutputsConfig;
use crate::tool::ToolMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

pub type ToolsMap = ToolMap;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EngineConfig {
    pub id: Option<EngineId>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub max_turns: Option<u32>,
    #[serde(default)]
    pub command: Option<String>,
    /// Only meaningful for `EngineId::Custom`.
    #[serde(default)]
    pub custom_steps: Vec<Value>,
    #[serde(default)]
    pub env: IndexMap<String, String>,
    #[serde(default)]
    pub agent_id: Option<String>,
}

/// `engine: copilot` (bare scalar, the id alone) is as valid on the wire as
/// the fully-spelled-out mapping (spec §3, worked example §1). Accept both.
impl<'de> Deserialize<'de> for EngineConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize, Default)]
        struct Full {
            id: Option<EngineId>,
            #[serde(default)]
            version: Option<String>,
            #[serde(default)]
            model: Option<String>,
            #[serde(default)]
            max_turns: Option<u32>,
            #[serde(default)]
            command: Option<String>,
            #[serde(default)]
            custom_steps: Vec<Value>,
            #[serde(default)]
            env: IndexMap<String, String>,
            #[serde(default)]
            agent_id: Option<String>,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shorthand {
            Id(EngineId),
            Full(Full),
        }

        Ok(match Shorthand::deserialize(deserializer)? {
            Shorthand::Id(id) => EngineConfig {
                id: Some(id),
                ..Default::default()
            },
            Shorthand::Full(f) => EngineConfig {
                id: f.id,
                version: f.version,
                model: f.model,
                max_turns: f.max_turns,
                command: f.command,
                custom_steps: f.custom_steps,
                env: f.env,
                agent_id: f.agent_id,
            },
        })
    }
}

/// The merged, validated, read-only in-memory workflow. Built by C3,
/// checked by C4, consumed by every downstream component.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkflowSpec {
    pub name: String,
    pub on: Value,
    pub permissions: Value,
    pub env: IndexMap<String, String>,
    pub concurrency: Option<Value>,
    pub timeout_minutes: Option<u32>,
    pub stop_time: Option<String>,

    pub engine: EngineConfig,
    pub tools: ToolsMap,
    pub network: NetworkPolicy,
    pub sandbox: SandboxConfig,
    pub safe_outputs: SafeOutputsConfig,
    pub safe_inputs: Option<Value>,

    pub imports: Vec<String>,
    pub custom_jobs: IndexMap<String, Value>,
    pub labels: Vec<String>,
    pub rate_limit: Option<Value>,
    pub manual_approval: bool,
    pub lock_for_agent: bool,
    pub ai_reaction: Option<String>,
    pub command: Option<String>,
    pub features: IndexMap<String, bool>,
    pub runs_on: Option<String>,
    pub strict: bool,
    pub github_token: Option<String>,
    pub stop_after: Option<String>,
    pub plugins: Option<Value>,
    pub cache_memory: Option<Value>,
    pub repo_memory: Option<Value>,
    pub runtimes: Option<Value>,
    pub agent: Option<Value>,
    pub project: Option<Value>,

    /// Merged markdown body, XML comments stripped, bodies joined in chain
    /// order (spec §4.3).
    pub body: String,
    /// Source fingerprint (sha256 over the pre-validation merged bytes) and
    /// the import path list, recorded in the lock file's comment header
    /// (spec §6, SPEC_FULL §C).
    pub fingerprint: String,
    pub import_paths: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_scalar_engine_id_deserializes() {
        let cfg: EngineConfig = serde_yaml::from_str("copilot").unwrap();
        assert_eq!(cfg.id, Some(EngineId::Copilot));
        assert_eq!(cfg.model, None);
    }

    #[test]
    fn mapping_form_engine_still_deserializes() {
        let cfg: EngineConfig = serde_yaml::from_str("id: claude\nmodel: opus\n").unwrap();
        assert_eq!(cfg.id, Some(EngineId::Claude));
        assert_eq!(cfg.model, Some("opus".to_string()));
    }
}
