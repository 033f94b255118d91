use awc_core::job::Step;
use awc_core::spec::WorkflowSpec;
use awc_core::tool::{ToolConfig, ToolMap};
use awc_core::EngineId;

use crate::capabilities::EngineCapabilities;
use crate::engine_trait::Engine;
use crate::mcp_render::{render_toml, McpServerEntry};
use crate::tool_encoding::ToolEncoding;

pub struct CodexEngine;

impl Engine for CodexEngine {
    fn id(&self) -> EngineId {
        EngineId::Codex
    }

    fn capabilities(&self) -> EngineCapabilities {
        EngineCapabilities {
            supports_tool_allowlist: true,
            supports_http_mcp: false,
            supports_max_turns: false,
            supports_max_tokens: true,
            supports_max_iterations: true,
            supports_firewall: true,
            supports_plugins: false,
            supports_llm_gateway: true,
            supports_web_fetch: false,
            supports_web_search: false,
        }
    }

    fn default_detection_model(&self) -> &'static str {
        "gpt-4o-mini"
    }

    fn required_secret_names(&self, _spec: &WorkflowSpec) -> Vec<String> {
        vec!["OPENAI_API_KEY".to_string()]
    }

    fn installation_steps(&self, _spec: &WorkflowSpec) -> Vec<Step> {
        vec![
            Step::run(
                "Validate Codex secret",
                "test -n \"$OPENAI_API_KEY\" || { echo 'missing OPENAI_API_KEY' >&2; exit 1; }",
            ),
            Step::run("Install Codex CLI", "npm install -g @openai/codex"),
        ]
    }

    fn execution_steps(&self, _spec: &WorkflowSpec, log_file_path: &str) -> Vec<Step> {
        vec![Step::run(
            "Run Codex",
            format!(
                "codex exec --config \"$GH_AW_MCP_CONFIG\" < \"$GH_AW_PROMPT\" 2>&1 | tee {log_file_path}"
            ),
        )]
    }

    fn render_mcp_config(&self, servers: &[McpServerEntry]) -> String {
        render_toml(servers)
    }

    fn tool_argument_encoding(&self, tools: &ToolMap) -> ToolEncoding {
        let mut flags = Vec::new();
        for (name, cfg) in tools {
            match cfg {
                ToolConfig::Bash(bash) if bash.wildcard => {
                    flags = vec!["--allow-tool=shell".to_string()];
                    break;
                }
                ToolConfig::Bash(bash) => {
                    for cmd in &bash.commands {
                        flags.push(format!("--allow-tool=shell({cmd})"));
                    }
                }
                ToolConfig::Edit(edit) if edit.write => {
                    flags.push("--allow-tool=apply_patch".to_string());
                }
                _ => flags.push(format!("--allow-tool={name}")),
            }
        }
        ToolEncoding::CliFlags(flags)
    }

    fn log_parser_script_id(&self) -> &'static str {
        "parse_codex_log"
    }
}
