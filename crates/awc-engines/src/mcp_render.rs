//! Shared rendering helpers for `Engine::render_mcp_config` (spec §4.5,
//! §4.8). Each engine picks JSON or TOML; the server-entry shape is common.

use awc_core::tool::McpTransportConfig;
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct McpServerEntry {
    pub name: String,
    pub transport: McpTransportConfig,
}

/// JSON rendering used by Copilot CLI, Copilot SDK, and Claude (spec §4.5:
/// "JSON for Copilot/Claude/Copilot-SDK").
pub fn render_json(servers: &[McpServerEntry]) -> String {
    #[derive(Serialize)]
    struct JsonDoc {
        #[serde(rename = "mcpServers")]
        mcp_servers: IndexMap<String, ServerJson>,
    }

    #[derive(Serialize)]
    #[serde(untagged)]
    enum ServerJson {
        Stdio {
            command: String,
            args: Vec<String>,
            env: IndexMap<String, String>,
        },
        Http {
            url: String,
            headers: IndexMap<String, String>,
        },
        Docker {
            image: String,
            mounts: Vec<String>,
        },
    }

    let mut mcp_servers = IndexMap::new();
    for entry in servers {
        let rendered = match &entry.transport {
            McpTransportConfig::Stdio { command, args, env } => ServerJson::Stdio {
                command: command.clone(),
                args: args.clone(),
                env: env.clone(),
            },
            McpTransportConfig::Http { url, headers } => ServerJson::Http {
                url: url.clone(),
                headers: headers.clone(),
            },
            McpTransportConfig::Docker {
                image, mounts, ..
            } => ServerJson::Docker {
                image: image.clone(),
                mounts: mounts.clone(),
            },
        };
        mcp_servers.insert(entry.name.clone(), rendered);
    }

    serde_json::to_string_pretty(&JsonDoc { mcp_servers }).unwrap_or_default()
}

/// TOML rendering used by Codex (spec §4.5: "TOML for Codex").
pub fn render_toml(servers: &[McpServerEntry]) -> String {
    let mut mcp_servers = toml::value::Table::new();
    for entry in servers {
        let mut table = toml::value::Table::new();
        match &entry.transport {
            McpTransportConfig::Stdio { command, args, env } => {
                table.insert("command".into(), toml::Value::String(command.clone()));
                table.insert(
                    "args".into(),
                    toml::Value::Array(args.iter().cloned().map(toml::Value::String).collect()),
                );
                let mut env_table = toml::value::Table::new();
                for (k, v) in env {
                    env_table.insert(k.clone(), toml::Value::String(v.clone()));
                }
                table.insert("env".into(), toml::Value::Table(env_table));
            }
            McpTransportConfig::Http { url, headers } => {
                table.insert("url".into(), toml::Value::String(url.clone()));
                let mut header_table = toml::value::Table::new();
                for (k, v) in headers {
                    header_table.insert(k.clone(), toml::Value::String(v.clone()));
                }
                table.insert("headers".into(), toml::Value::Table(header_table));
            }
            McpTransportConfig::Docker { image, mounts, .. } => {
                table.insert("image".into(), toml::Value::String(image.clone()));
                table.insert(
                    "mounts".into(),
                    toml::Value::Array(mounts.iter().cloned().map(toml::Value::String).collect()),
                );
            }
        }
        mcp_servers.insert(entry.name.clone(), toml::Value::Table(table));
    }
    let mut doc = toml::value::Table::new();
    doc.insert("mcp_servers".into(), toml::Value::Table(mcp_servers));
    toml::to_string_pretty(&toml::Value::Table(doc)).unwrap_or_default()
}
