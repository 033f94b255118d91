use awc_core::job::Step;
use awc_core::spec::WorkflowSpec;
use awc_core::tool::{ToolConfig, ToolMap};
use awc_core::EngineId;

use crate::capabilities::EngineCapabilities;
use crate::engine_trait::Engine;
use crate::mcp_render::{render_json, McpServerEntry};
use crate::tool_encoding::ToolEncoding;

pub struct ClaudeEngine;

impl Engine for ClaudeEngine {
    fn id(&self) -> EngineId {
        EngineId::Claude
    }

    fn capabilities(&self) -> EngineCapabilities {
        EngineCapabilities {
            supports_tool_allowlist: true,
            supports_http_mcp: true,
            supports_max_turns: true,
            supports_max_tokens: true,
            supports_max_iterations: false,
            supports_firewall: true,
            supports_plugins: true,
            supports_llm_gateway: true,
            supports_web_fetch: true,
            supports_web_search: true,
        }
    }

    fn default_detection_model(&self) -> &'static str {
        "claude-haiku-4-5"
    }

    fn required_secret_names(&self, _spec: &WorkflowSpec) -> Vec<String> {
        vec!["ANTHROPIC_API_KEY".to_string()]
    }

    fn installation_steps(&self, _spec: &WorkflowSpec) -> Vec<Step> {
        vec![
            Step::run(
                "Validate Claude secret",
                "test -n \"$ANTHROPIC_API_KEY\" || { echo 'missing ANTHROPIC_API_KEY' >&2; exit 1; }",
            ),
            Step::run("Install Claude Code", "npm install -g @anthropic-ai/claude-code"),
        ]
    }

    fn execution_steps(&self, _spec: &WorkflowSpec, log_file_path: &str) -> Vec<Step> {
        vec![Step::run(
            "Run Claude Code",
            format!(
                "claude --mcp-config \"$GH_AW_MCP_CONFIG\" --prompt-file \"$GH_AW_PROMPT\" 2>&1 | tee {log_file_path}"
            ),
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
                    flags = vec!["--allow-tool=Bash".to_string()];
                    break;
                }
                ToolConfig::Bash(bash) => {
                    for cmd in &bash.commands {
                        flags.push(format!("--allow-tool=Bash({cmd})"));
                    }
                }
                ToolConfig::Edit(edit) if edit.write => {
                    flags.push("--allow-tool=Edit".to_string());
                }
                _ => flags.push(format!("--allow-tool={name}")),
            }
        }
        ToolEncoding::CliFlags(flags)
    }

    fn log_parser_script_id(&self) -> &'static str {
        "parse_claude_log"
    }
}
