use awc_core::job::Step;
use awc_core::spec::WorkflowSpec;
use awc_core::tool::{ToolConfig, ToolMap};
use awc_core::EngineId;

use crate::capabilities::EngineCapabilities;
use crate::engine_trait::Engine;
use crate::mcp_render::{render_json, McpServerEntry};
use crate::tool_encoding::ToolEncoding;

pub struct CopilotSdkEngine;

impl Engine for CopilotSdkEngine {
    fn id(&self) -> EngineId {
        EngineId::CopilotSdk
    }

    fn capabilities(&self) -> EngineCapabilities {
        EngineCapabilities {
            supports_tool_allowlist: true,
            supports_http_mcp: true,
            supports_max_turns: true,
            supports_max_tokens: true,
            supports_max_iterations: true,
            supports_firewall: true,
            supports_plugins: true,
            supports_llm_gateway: true,
            supports_web_fetch: true,
            supports_web_search: true,
        }
    }

    fn default_detection_model(&self) -> &'static str {
        "gpt-4o-mini"
    }

    fn required_secret_names(&self, _spec: &WorkflowSpec) -> Vec<String> {
        vec!["COPILOT_SDK_TOKEN".to_string()]
    }

    fn installation_steps(&self, _spec: &WorkflowSpec) -> Vec<Step> {
        vec![
            Step::run(
                "Validate Copilot SDK secret",
                "test -n \"$COPILOT_SDK_TOKEN\" || { echo 'missing COPILOT_SDK_TOKEN' >&2; exit 1; }",
            ),
            Step::run("Install Copilot SDK runtime", "npm install -g @github/copilot-sdk"),
        ]
    }

    fn execution_steps(&self, _spec: &WorkflowSpec, log_file_path: &str) -> Vec<Step> {
        vec![Step::run(
            "Run Copilot SDK",
            format!("node ./.github/aw/run-copilot-sdk.js 2>&1 | tee {log_file_path}"),
        )]
    }

    fn render_mcp_config(&self, servers: &[McpServerEntry]) -> String {
        render_json(servers)
    }

    fn tool_argument_encoding(&self, tools: &ToolMap) -> ToolEncoding {
        let mut available = Vec::new();
        for (name, cfg) in tools {
            match cfg {
                ToolConfig::Bash(bash) if bash.wildcard => {
                    return ToolEncoding::SdkArray(vec!["*".to_string()]);
                }
                ToolConfig::Bash(bash) if bash.commands.is_empty() => {
                    available.push("bash".to_string());
                }
                ToolConfig::Bash(bash) => {
                    for cmd in &bash.commands {
                        available.push(format!("bash({cmd})"));
                    }
                }
                _ => available.push(name.clone()),
            }
        }
        ToolEncoding::SdkArray(available)
    }

    fn log_parser_script_id(&self) -> &'static str {
        "parse_copilot_sdk_log"
    }
}
