//! C11 — Step list generation (spec §4.11).
//!
//! Expands the `agent` job into its fixed 12-step shape and builds the
//! `safe_outputs` job's consolidated handler-config step. Job identity,
//! `needs`, and conditions come from C10; this stage only fills `steps`.

use awc_core::job::Step;
use awc_core::spec::WorkflowSpec;
use awc_engines::Engine;
use awc_mcp::McpSynthesis;
use indexmap::IndexMap;
use serde_json::json;

pub const PROMPT_FILE_PATH: &str = "/tmp/gh-aw/aw-prompt.md";
pub const MCP_CONFIG_PATH: &str = "/tmp/gh-aw/mcp-config";
pub const AGENT_LOG_PATH: &str = "/tmp/gh-aw/agent-output.log";

/// The fixed 12-step shape of the `agent` job (spec §4.11): checkout the
/// actions bundle, set up the runtime, checkout `.github/`, install
/// dependencies, install the engine, assemble the prompt, materialize the
/// MCP config, run the engine, collect safe outputs, parse the log, upload
/// artifacts, clean up.
pub fn agent_job_steps(spec: &WorkflowSpec, engine: &dyn Engine, mcp: &McpSynthesis) -> Vec<Step> {
    let mut steps = Vec::new();

    steps.push(uses("Checkout actions", "actions/checkout@v4", &[("sparse-checkout", ".github/actions")]));
    steps.push(uses("Set up Node.js", "actions/setup-node@v4", &[("node-version", "20")]));
    steps.push(uses("Checkout workflow sources", "actions/checkout@v4", &[("sparse-checkout", ".github")]));

    let mut install = Step::run("Install workflow dependencies", "npm ci --prefix .github/aw || true");
    if spec.features.get("staged").copied().unwrap_or(false) {
        install = install.with_env("GH_AW_STAGED", "1");
    }
    steps.push(install);

    steps.extend(engine.installation_steps(spec));

    steps.push(write_file_step(
        "Assemble prompt",
        PROMPT_FILE_PATH,
        "$GH_AW_PROMPT_BODY",
    ));

    let rendered_mcp_config = engine.render_mcp_config(&mcp.servers);
    let mut mcp_step = write_file_step("Write MCP server configuration", MCP_CONFIG_PATH, "$GH_AW_MCP_CONFIG_BODY");
    mcp_step = mcp_step.with_env("GH_AW_MCP_CONFIG_BODY", rendered_mcp_config);
    for (key, value) in &mcp.env {
        mcp_step = mcp_step.with_env(key.clone(), value.clone());
    }
    steps.push(mcp_step);

    steps.extend(engine.execution_steps(spec, AGENT_LOG_PATH));

    steps.push(Step::run(
        "Collect safe outputs",
        format!("cat {AGENT_LOG_PATH}.safe-outputs.jsonl 2>/dev/null >> \"$GITHUB_OUTPUT\" || true"),
    ));

    steps.push(
        Step::uses("Parse agent log", format!("./.github/actions/{}", engine.log_parser_script_id()))
            .with_env("GH_AW_AGENT_LOG", AGENT_LOG_PATH),
    );

    steps.push(uses_with_always(
        "Upload agent log",
        "actions/upload-artifact@v4",
        &[("name", "agent-output.log"), ("path", AGENT_LOG_PATH)],
    ));

    steps.push(Step::run("Clean up workspace", format!("rm -rf {PROMPT_FILE_PATH} {MCP_CONFIG_PATH}")));

    steps
}

/// The `safe_outputs` job's single consolidated handler-config step (spec
/// §4.11): one JSON blob driving every enabled output type, and a narrower
/// project-only blob for the project-token code path.
pub fn safe_outputs_handler_step(spec: &WorkflowSpec) -> Step {
    let mut handler_config = serde_json::Map::new();
    let mut project_config = serde_json::Map::new();

    for (output_type, policy) in &spec.safe_outputs.policies {
        let entry = json!({
            "max": policy.max,
            "labels": policy.labels,
            "assignees": policy.assignees,
            "title_prefix": policy.title_prefix,
            "footer": policy.footer,
            "github_token": policy.github_token,
            "threat_detection": policy.threat_detection,
            "continue_on_error": policy.continue_on_error,
        });
        if output_type.is_project_related() {
            project_config.insert(output_type.as_snake_case().to_string(), entry.clone());
        }
        handler_config.insert(output_type.as_snake_case().to_string(), entry);
    }

    Step::run(
        "Collect safe-output handler configuration",
        "true",
    )
    .with_env(
        "GH_AW_SAFE_OUTPUTS_HANDLER_CONFIG",
        serde_json::to_string(&handler_config).unwrap_or_default(),
    )
    .with_env(
        "GH_AW_SAFE_OUTPUTS_PROJECT_HANDLER_CONFIG",
        serde_json::to_string(&project_config).unwrap_or_default(),
    )
}

fn write_file_step(name: impl Into<String>, path: &str, body_env_ref: &str) -> Step {
    Step::run(name, format!("cat > {path} <<'EOF'\n{body_env_ref}\nEOF"))
}

fn uses(name: &str, action: &str, with: &[(&str, &str)]) -> Step {
    let mut step = Step::uses(name, action);
    let mut map = IndexMap::new();
    for (k, v) in with {
        map.insert(k.to_string(), serde_yaml::Value::String(v.to_string()));
    }
    step.with = map;
    step
}

fn uses_with_always(name: &str, action: &str, with: &[(&str, &str)]) -> Step {
    uses(name, action, with).with_if("always()")
}

#[cfg(test)]
mod tests {
    use super::*;
    use awc_engines::engine_for;
    use awc_core::EngineId;

    #[test]
    fn agent_job_has_install_and_execution_steps() {
        let spec = WorkflowSpec::default();
        let engine = engine_for(EngineId::Copilot);
        let mcp = McpSynthesis { servers: Vec::new(), env: IndexMap::new() };
        let steps = agent_job_steps(&spec, engine.as_ref(), &mcp);
        assert!(steps.iter().any(|s| s.name.contains("Install GitHub Copilot CLI")));
        assert!(steps.iter().any(|s| s.name.contains("Run Copilot CLI")));
    }

    #[test]
    fn staged_feature_exports_staged_env_var() {
        let mut spec = WorkflowSpec::default();
        spec.features.insert("staged".to_string(), true);
        let engine = engine_for(EngineId::Claude);
        let mcp = McpSynthesis { servers: Vec::new(), env: IndexMap::new() };
        let steps = agent_job_steps(&spec, engine.as_ref(), &mcp);
        let install_step = steps.iter().find(|s| s.name == "Install workflow dependencies").unwrap();
        assert_eq!(install_step.env.get("GH_AW_STAGED"), Some(&"1".to_string()));
    }

    #[test]
    fn safe_outputs_handler_config_is_valid_json() {
        let mut spec = WorkflowSpec::default();
        let mut policies = IndexMap::new();
        policies.insert(
            awc_core::safe_outputs::SafeOutputType::CreateIssue,
            awc_core::safe_outputs::SafeOutputPolicy::default(),
        );
        spec.safe_outputs = awc_core::safe_outputs::SafeOutputsConfig {
            policies,
            ..awc_core::safe_outputs::SafeOutputsConfig::default()
        };
        let step = safe_outputs_handler_step(&spec);
        let raw = step.env.get("GH_AW_SAFE_OUTPUTS_HANDLER_CONFIG").unwrap();
        let parsed: serde_json::Value = serde_json::from_str(raw).unwrap();
        assert!(parsed.get("create_issue").is_some());
    }
}
