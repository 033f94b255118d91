use awc_core::job::Step;
use awc_core::spec::WorkflowSpec;
use awc_core::tool::{ToolConfig, ToolMap};
use awc_core::EngineId;

use crate::capabilities::EngineCapabilities;
use crate::engine_trait::Engine;
use crate::mcp_render::{render_json, McpServerEntry};
use crate::tool_encoding::ToolEncoding;

pub struct CopilotEngine;

impl Engine for CopilotEngine {
    fn id(&self) -> EngineId {
        EngineId::Copilot
    }

    fn capabilities(&self) -> EngineCapabilities {
        EngineCapabilities {
            supports_tool_allowlist: true,
            supports_http_mcp: false,
            supports_max_turns: true,
            supports_max_tokens: false,
            supports_max_iterations: true,
            supports_firewall: true,
            supports_plugins: false,
            supports_llm_gateway: false,
            supports_web_fetch: true,
            supports_web_search: true,
        }
    }

    fn default_detection_model(&self) -> &'static str {
        "gpt-4o-mini"
    }

    fn required_secret_names(&self, _spec: &WorkflowSpec) -> Vec<String> {
        vec!["COPILOT_CLI_TOKEN".to_string()]
    }

    fn installation_steps(&self, _spec: &WorkflowSpec) -> Vec<Step> {
        vec![
            Step::run(
                "Validate Copilot secret",
                "test -n \"$COPILOT_CLI_TOKEN\" || { echo 'missing COPILOT_CLI_TOKEN' >&2; exit 1; }",
            ),
            Step::run(
                "Install GitHub Copilot CLI",
                "npm install -g @github/copilot-cli",
            ),
        ]
    }

    fn execution_steps(&self, _spec: &WorkflowSpec, log_file_path: &str) -> Vec<Step> {
        vec![Step::run(
            "Run Copilot CLI",
            format!("copilot --prompt-file \"$GH_AW_PROMPT\" 2>&1 | tee {log_file_path}"),
        )]
    }

    fn render_mcp_config(&self, servers: &[McpServerEntry]) -> String {
        render_json(servers)
    }

    fn tool_argument_encoding(&self, tools: &ToolMap) -> ToolEncoding {
        let mut flags = Vec::new();
        for (name, cfg) in tools {
            match cfg {
                ToolConfig::Bash(bash) if bash.wildcard => {
                    flags = vec!["--allow-tool=*".to_string()];
                    break;
                }
                ToolConfig::Bash(bash) => {
                    for cmd in &bash.commands {
                        flags.push(format!("--allow-tool=shell({cmd})"));
                    }
                }
                ToolConfig::Edit(edit) if edit.write => {
                    flags.push("--allow-tool=write".to_string());
                }
                _ => flags.push(format!("--allow-tool={name}")),
            }
        }
        ToolEncoding::CliFlags(flags)
    }

    fn log_parser_script_id(&self) -> &'static str {
        "parse_copilot_log"
    }
}
