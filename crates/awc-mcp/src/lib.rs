//! C8 — MCP server synthesis (spec §4.8).
//!
//! Builds the full MCP server map an engine will render: the fixed
//! built-ins (`github`, `playwright`, `serena`, `safe-outputs`,
//! `safe-inputs`, `agentic-workflows`) activated by feature flags or
//! declared tools, plus every user-declared `tools.*` MCP server. Under a
//! sandbox, loopback URLs are rewritten so a contained agent process can
//! still reach a host-side server.

use awc_core::spec::WorkflowSpec;
use awc_core::tool::{McpTransportConfig, ToolConfig};
use awc_engines::McpServerEntry;
use indexmap::IndexMap;

pub struct McpSynthesis {
    pub servers: Vec<McpServerEntry>,
    /// Per-server startup/tool timeout exports (spec §4.8: "timeouts are
    /// passed to the engine as environment, not baked into the config
    /// file").
    pub env: IndexMap<String, String>,
}

pub fn synthesize(spec: &WorkflowSpec, sandbox_active: bool) -> McpSynthesis {
    let mut servers = Vec::new();
    let mut env = IndexMap::new();

    if let Some(ToolConfig::GitHub(github)) = spec.tools.get("github") {
        servers.push(builtin_github_server(github.read_only, github.custom_token.as_deref()));
    }
    if feature_enabled(spec, "playwright") {
        servers.push(builtin_playwright_server());
    }
    if feature_enabled(spec, "serena") {
        servers.push(builtin_serena_server());
    }
    if !spec.safe_outputs.is_empty() {
        servers.push(builtin_safe_outputs_server());
    }
    if spec.safe_inputs.is_some() {
        servers.push(builtin_safe_inputs_server());
    }
    if feature_enabled(spec, "agentic-workflows") {
        servers.push(builtin_agentic_workflows_server());
    }

    for (name, cfg) in &spec.tools {
        if let ToolConfig::Mcp(mcp) = cfg {
            let mut transport = mcp.transport.clone();
            if sandbox_active {
                transport = rewrite_loopback(transport);
            }
            if let Some(secs) = mcp.startup_timeout_secs {
                env.insert(format!("GH_AW_MCP_STARTUP_TIMEOUT_{}", shout(name)), secs.to_string());
            }
            if let Some(secs) = mcp.tool_timeout_secs {
                env.insert(format!("GH_AW_MCP_TOOL_TIMEOUT_{}", shout(name)), secs.to_string());
            }
            servers.push(McpServerEntry {
                name: name.clone(),
                transport,
            });
        }
    }

    McpSynthesis { servers, env }
}

fn feature_enabled(spec: &WorkflowSpec, name: &str) -> bool {
    spec.features.get(name).copied().unwrap_or(false)
}

fn builtin_github_server(read_only: bool, custom_token: Option<&str>) -> McpServerEntry {
    let token_env = custom_token.unwrap_or("${{ secrets.GITHUB_TOKEN }}").to_string();
    let mut env = IndexMap::new();
    env.insert("GITHUB_PERSONAL_ACCESS_TOKEN".to_string(), token_env);
    if read_only {
        env.insert("GITHUB_READ_ONLY".to_string(), "1".to_string());
    }
    McpServerEntry {
        name: "github".to_string(),
        transport: McpTransportConfig::Docker {
            image: "ghcr.io/github/github-mcp-server".to_string(),
            mounts: Vec::new(),
            network: None,
        },
    }
    .with_env_hint(env)
}

fn builtin_playwright_server() -> McpServerEntry {
    McpServerEntry {
        name: "playwright".to_string(),
        transport: McpTransportConfig::Stdio {
            command: "npx".to_string(),
            args: vec!["-y".to_string(), "@playwright/mcp@latest".to_string()],
            env: IndexMap::new(),
        },
    }
}

fn builtin_serena_server() -> McpServerEntry {
    McpServerEntry {
        name: "serena".to_string(),
        transport: McpTransportConfig::Stdio {
            command: "uvx".to_string(),
            args: vec!["--from".to_string(), "serena-mcp".to_string(), "serena-mcp-server".to_string()],
            env: IndexMap::new(),
        },
    }
}

fn builtin_safe_outputs_server() -> McpServerEntry {
    McpServerEntry {
        name: "safe-outputs".to_string(),
        transport: McpTransportConfig::Stdio {
            command: "node".to_string(),
            args: vec!["./.github/aw/safe-outputs-mcp-server.cjs".to_string()],
            env: IndexMap::new(),
        },
    }
}

fn builtin_safe_inputs_server() -> McpServerEntry {
    McpServerEntry {
        name: "safe-inputs".to_string(),
        transport: McpTransportConfig::Stdio {
            command: "node".to_string(),
            args: vec!["./.github/aw/safe-inputs-mcp-server.cjs".to_string()],
            env: IndexMap::new(),
        },
    }
}

fn builtin_agentic_workflows_server() -> McpServerEntry {
    McpServerEntry {
        name: "agentic-workflows".to_string(),
        transport: McpTransportConfig::Stdio {
            command: "node".to_string(),
            args: vec!["./.github/aw/agentic-workflows-mcp-server.cjs".to_string()],
            env: IndexMap::new(),
        },
    }
}

/// Rewrite `http://localhost:*` / `http://127.0.0.1:*` URLs to the sandbox
/// host-bridge name, since a contained process cannot reach the runner's
/// own loopback interface directly (spec §4.6/§4.8).
fn rewrite_loopback(transport: McpTransportConfig) -> McpTransportConfig {
    match transport {
        McpTransportConfig::Http { url, headers } => McpTransportConfig::Http {
            url: url
                .replace("localhost", "host.docker.internal")
                .replace("127.0.0.1", "host.docker.internal"),
            headers,
        },
        other => other,
    }
}

fn shout(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

trait WithEnvHint {
    fn with_env_hint(self, env: IndexMap<String, String>) -> McpServerEntry;
}

impl WithEnvHint for McpServerEntry {
    /// `Docker` transports carry their MCP-server secret wiring as env on
    /// the container, not on the entry itself; this folds it into a stdio
    /// wrapper invocation the job-step layer renders as `docker run -e ...`.
    fn with_env_hint(self, env: IndexMap<String, String>) -> McpServerEntry {
        match self.transport {
            McpTransportConfig::Docker { image, mounts, network } => McpServerEntry {
                name: self.name,
                transport: McpTransportConfig::Stdio {
                    command: "docker".to_string(),
                    args: docker_run_args(&image, &mounts, network.as_deref(), &env),
                    env,
                },
            },
            other => McpServerEntry {
                name: self.name,
                transport: other,
            },
        }
    }
}

fn docker_run_args(
    image: &str,
    mounts: &[String],
    network: Option<&str>,
    env: &IndexMap<String, String>,
) -> Vec<String> {
    let mut args = vec!["run".to_string(), "-i".to_string(), "--rm".to_string()];
    for mount in mounts {
        args.push("-v".to_string());
        args.push(mount.clone());
    }
    if let Some(network) = network {
        args.push("--network".to_string());
        args.push(network.to_string());
    }
    for key in env.keys() {
        args.push("-e".to_string());
        args.push(key.clone());
    }
    args.push(image.to_string());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use awc_core::safe_outputs::SafeOutputsConfig;

    fn base_spec() -> WorkflowSpec {
        WorkflowSpec::default()
    }

    #[test]
    fn github_tool_adds_builtin_server() {
        let mut spec = base_spec();
        spec.tools.insert(
            "github".to_string(),
            ToolConfig::GitHub(awc_core::tool::GitHubToolConfig::default()),
        );
        let synthesis = synthesize(&spec, false);
        assert!(synthesis.servers.iter().any(|s| s.name == "github"));
    }

    #[test]
    fn safe_outputs_server_only_added_when_policies_present() {
        let spec = base_spec();
        assert!(synthesize(&spec, false).servers.is_empty());

        let mut with_policy = base_spec();
        with_policy.safe_outputs = SafeOutputsConfig {
            policies: {
                let mut m = IndexMap::new();
                m.insert(
                    awc_core::safe_outputs::SafeOutputType::CreateIssue,
                    awc_core::safe_outputs::SafeOutputPolicy::default(),
                );
                m
            },
            ..SafeOutputsConfig::default()
        };
        assert!(synthesize(&with_policy, false).servers.iter().any(|s| s.name == "safe-outputs"));
    }

    #[test]
    fn sandbox_rewrites_loopback_urls() {
        let mut spec = base_spec();
        spec.tools.insert(
            "local".to_string(),
            ToolConfig::Mcp(awc_core::tool::McpToolConfig {
                transport: McpTransportConfig::Http {
                    url: "http://localhost:9000".to_string(),
                    headers: IndexMap::new(),
                },
                startup_timeout_secs: None,
                tool_timeout_secs: None,
            }),
        );
        let synthesis = synthesize(&spec, true);
        let entry = synthesis.servers.iter().find(|s| s.name == "local").unwrap();
        match &entry.transport {
            McpTransportConfig::Http { url, .. } => assert!(url.contains("host.docker.internal")),
            _ => panic!("expected http transport"),
        }
    }

    #[test]
    fn timeout_fields_export_as_env() {
        let mut spec = base_spec();
        spec.tools.insert(
            "local".to_string(),
            ToolConfig::Mcp(awc_core::tool::McpToolConfig {
                transport: McpTransportConfig::Stdio {
                    command: "local-server".to_string(),
                    args: Vec::new(),
                    env: IndexMap::new(),
                },
                startup_timeout_secs: Some(30),
                tool_timeout_secs: Some(60),
            }),
        );
        let synthesis = synthesize(&spec, false);
        assert_eq!(synthesis.env.get("GH_AW_MCP_STARTUP_TIMEOUT_LOCAL"), Some(&"30".to_string()));
        assert_eq!(synthesis.env.get("GH_AW_MCP_TOOL_TIMEOUT_LOCAL"), Some(&"60".to_string()));
    }
}
