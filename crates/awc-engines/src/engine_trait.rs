//! The common engine capability interface (spec §4.5, §9 "Polymorphism over
//! engines"). Adding a new engine is a single-file addition (one more
//! module implementing `Engine`) plus one registry-function arm; no other
//! component changes. Grounded on the teacher's `Executor` data enum
//! (`csa_executor::executor::Executor`), generalized from a closed `enum`
//! with inherent methods to a trait so each engine's install/execute/encode
//! logic lives in its own file rather than one large match.

use awc_core::job::Step;
use awc_core::spec::WorkflowSpec;
use awc_core::tool::ToolMap;
use awc_core::EngineId;

use crate::capabilities::EngineCapabilities;
use crate::mcp_render::McpServerEntry;
use crate::tool_encoding::ToolEncoding;

pub trait Engine: Send + Sync {
    fn id(&self) -> EngineId;

    fn display_name(&self) -> &'static str {
        self.id().display_name()
    }

    fn experimental(&self) -> bool {
        self.id().experimental()
    }

    fn capabilities(&self) -> EngineCapabilities;

    /// Model used by the threat-detection sub-job when unspecified (spec
    /// §4.5).
    fn default_detection_model(&self) -> &'static str;

    /// Secret identifiers this engine needs; used to filter the agent job's
    /// environment so custom steps cannot leak secrets the engine itself
    /// didn't request (spec §4.5).
    fn required_secret_names(&self, spec: &WorkflowSpec) -> Vec<String>;

    fn installation_steps(&self, spec: &WorkflowSpec) -> Vec<Step>;

    fn execution_steps(&self, spec: &WorkflowSpec, log_file_path: &str) -> Vec<Step>;

    /// Render this engine's native MCP configuration text (JSON or TOML)
    /// for the given server set.
    fn render_mcp_config(&self, servers: &[McpServerEntry]) -> String;

    fn tool_argument_encoding(&self, tools: &ToolMap) -> ToolEncoding;

    fn log_parser_script_id(&self) -> &'static str;

    fn log_file_for_parsing(&self) -> &'static str {
        "agent-output.log"
    }
}

/// Scan engine-declared env values for `${{ secrets.NAME }}` references, the
/// shape the `Custom` engine's secret requirements are discovered from
/// since it has no fixed secret table of its own.
pub(crate) fn secrets_referenced_in_env(spec: &WorkflowSpec) -> Vec<String> {
    use regex::Regex;
    use std::sync::LazyLock;
    static SECRET_REF: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\$\{\{\s*secrets\.([A-Za-z0-9_]+)\s*\}\}").unwrap());

    let mut names: Vec<String> = Vec::new();
    for value in spec.engine.env.values() {
        for cap in SECRET_REF.captures_iter(value) {
            let name = cap[1].to_string();
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}
