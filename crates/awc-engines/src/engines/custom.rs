//! The `Custom` engine has no fixed CLI of its own (spec §4.5: "Custom: user
//! supplies the full step list"). Its installation/execution steps come
//! straight from `engine.custom_steps`; its secrets are discovered from
//! `${{ secrets.* }}` references rather than a fixed table.

use awc_core::job::Step;
use awc_core::spec::WorkflowSpec;
use awc_core::tool::{ToolConfig, ToolMap};
use awc_core::EngineId;
use serde_yaml::Value;

use crate::capabilities::EngineCapabilities;
use crate::engine_trait::{secrets_referenced_in_env, Engine};
use crate::mcp_render::{render_json, McpServerEntry};
use crate::tool_encoding::ToolEncoding;

pub struct CustomEngine;

impl Engine for CustomEngine {
    fn id(&self) -> EngineId {
        EngineId::Custom
    }

    fn capabilities(&self) -> EngineCapabilities {
        EngineCapabilities {
            supports_tool_allowlist: false,
            supports_http_mcp: true,
            supports_max_turns: false,
            supports_max_tokens: false,
            supports_max_iterations: false,
            supports_firewall: true,
            supports_plugins: false,
            supports_llm_gateway: false,
            supports_web_fetch: false,
            supports_web_search: false,
        }
    }

    fn default_detection_model(&self) -> &'static str {
        "gpt-4o-mini"
    }

    fn required_secret_names(&self, spec: &WorkflowSpec) -> Vec<String> {
        secrets_referenced_in_env(spec)
    }

    fn installation_steps(&self, _spec: &WorkflowSpec) -> Vec<Step> {
        Vec::new()
    }

    fn execution_steps(&self, spec: &WorkflowSpec, _log_file_path: &str) -> Vec<Step> {
        spec.engine
            .custom_steps
            .iter()
            .filter_map(step_from_value)
            .collect()
    }

    fn render_mcp_config(&self, servers: &[McpServerEntry]) -> String {
        render_json(servers)
    }

    fn tool_argument_encoding(&self, tools: &ToolMap) -> ToolEncoding {
        // The Custom engine has no CLI convention of its own; expose the
        // declared tool names verbatim for its steps to consume via env.
        let mut names: Vec<String> = Vec::new();
        for (name, cfg) in tools {
            if let ToolConfig::Bash(bash) = cfg {
                if bash.wildcard {
                    names.push("*".to_string());
                    continue;
                }
            }
            names.push(name.clone());
        }
        ToolEncoding::SdkArray(names)
    }

    fn log_parser_script_id(&self) -> &'static str {
        "parse_generic_log"
    }
}

fn step_from_value(value: &Value) -> Option<Step> {
    let mapping = value.as_mapping()?;
    let get_str = |key: &str| -> Option<String> {
        mapping
            .get(Value::String(key.to_string()))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    };

    let name = get_str("name").unwrap_or_else(|| "Custom step".to_string());
    let mut step = if let Some(run) = get_str("run") {
        Step::run(name, run)
    } else if let Some(uses) = get_str("uses") {
        Step::uses(name, uses)
    } else {
        return None;
    };

    if let Some(env_value) = mapping.get(Value::String("env".to_string())) {
        if let Some(env_mapping) = env_value.as_mapping() {
            for (k, v) in env_mapping {
                if let (Some(k), Some(v)) = (k.as_str(), v.as_str()) {
                    step = step.with_env(k, v);
                }
            }
        }
    }
    if let Some(with_value) = mapping.get(Value::String("with".to_string())) {
        if let Some(with_mapping) = with_value.as_mapping() {
            for (k, v) in with_mapping {
                if let Some(k) = k.as_str() {
                    step.with.insert(k.to_string(), v.clone());
                }
            }
        }
    }
    if let Some(if_cond) = get_str("if") {
        step = step.with_if(if_cond);
    }

    Some(step)
}
