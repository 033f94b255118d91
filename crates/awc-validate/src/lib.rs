//! C4 — Validator (spec §4.4).
//!
//! Deserializes a merged frontmatter map into a `WorkflowSpec`, checking the
//! closed top-level key set and the cross-field policy rules spec §4.4
//! lists (sandbox mode exclusivity, capability-gated network policy, job
//! graph references). Collects every diagnostic before failing, per spec §7
//! "propagation policy" — a caller never sees only the first problem.

mod schema;
mod suggest;

use awc_core::diagnostic::{CompileError, Diagnostic, DiagnosticSink};
use awc_core::network::{NetworkPolicy, SandboxConfig};
use awc_core::spec::{EngineConfig, WorkflowSpec};
use awc_core::tool::ToolsMap;
use awc_core::EngineId;
use awc_engines::engine_for;
use awc_merge::MergeOutput;
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

pub use schema::KNOWN_TOP_LEVEL_KEYS;
pub use suggest::suggest_closest;

/// The validated workflow plus every warning recorded along the way (spec
/// §4.4: warnings surface even when the compile succeeds).
pub struct ValidationReport {
    pub spec: WorkflowSpec,
    pub warnings: Vec<Diagnostic>,
}

pub fn validate(merged: MergeOutput, source_file: impl Into<PathBuf>) -> Result<ValidationReport, CompileError> {
    let file = source_file.into();
    let mapping = match &merged.frontmatter {
        Value::Mapping(m) => m.clone(),
        Value::Null => Mapping::new(),
        _ => {
            let diag = Diagnostic::error(&file, "frontmatter must be a mapping");
            return Err(CompileError::Schema(diag));
        }
    };

    let strict = get_bool(&mapping, "strict").unwrap_or(false);
    let mut sink = DiagnosticSink::new(strict);

    schema::check_unknown_keys(&mapping, &file, &mut sink);

    let name = get_str(&mapping, "name")
        .unwrap_or("")
        .to_string();
    let on = mapping.get(Value::String("on".to_string())).cloned().unwrap_or(Value::Null);
    let permissions = mapping
        .get(Value::String("permissions".to_string()))
        .cloned()
        .unwrap_or(Value::Null);
    let env = get_string_map(&mapping, "env");
    let concurrency = mapping.get(Value::String("concurrency".to_string())).cloned();
    let timeout_minutes = get_u32(&mapping, "timeout-minutes");
    let stop_time = get_str(&mapping, "stop-time").map(str::to_string);

    let engine = deserialize_field::<EngineConfig>(&mapping, "engine", &file, &mut sink).unwrap_or_default();
    let tools = deserialize_field::<ToolsMap>(&mapping, "tools", &file, &mut sink).unwrap_or_default();
    let network = deserialize_field::<NetworkPolicy>(&mapping, "network", &file, &mut sink).unwrap_or_default();
    let sandbox = deserialize_field::<SandboxConfig>(&mapping, "sandbox", &file, &mut sink).unwrap_or_default();
    let safe_outputs_value = mapping.get(Value::String("safe-outputs".to_string())).cloned();
    let safe_outputs = awc_safe_outputs::normalize(safe_outputs_value.as_ref(), &file, &mut sink);
    let safe_inputs = mapping.get(Value::String("safe-inputs".to_string())).cloned();

    let imports = get_string_seq(&mapping, "imports");
    let custom_jobs = get_job_map(&mapping, "jobs");
    let labels = get_string_seq(&mapping, "labels");
    let rate_limit = mapping.get(Value::String("rate-limit".to_string())).cloned();
    let manual_approval = get_bool(&mapping, "manual-approval").unwrap_or(false);
    let lock_for_agent = get_bool(&mapping, "lock-for-agent").unwrap_or(false);
    let ai_reaction = get_str(&mapping, "ai-reaction").map(str::to_string);
    let command = get_str(&mapping, "command").map(str::to_string);
    let features = get_bool_map(&mapping, "features");
    let runs_on = get_str(&mapping, "runs-on").map(str::to_string);
    let github_token = get_str(&mapping, "github-token").map(str::to_string);
    let stop_after = get_str(&mapping, "stop-after").map(str::to_string);
    let plugins = mapping.get(Value::String("plugins".to_string())).cloned();
    let cache_memory = mapping.get(Value::String("cache-memory".to_string())).cloned();
    let repo_memory = mapping.get(Value::String("repo-memory".to_string())).cloned();
    let runtimes = mapping.get(Value::String("runtimes".to_string())).cloned();
    let agent = mapping.get(Value::String("agent".to_string())).cloned();
    let project = mapping.get(Value::String("project".to_string())).cloned();

    validate_labels(&labels, &file, &mut sink);
    validate_sandbox_exclusivity(&sandbox, &file, &mut sink);
    validate_job_references(&custom_jobs, &file, &mut sink);
    if let Some(engine_id) = engine.id {
        validate_network_capability(engine_id, strict, &network, &file, &mut sink);
        validate_engine_capability_caps(engine_id, &engine, &file, &mut sink);
    } else {
        sink.error(&file, "workflow has no `engine` configured");
    }

    let spec = WorkflowSpec {
        name,
        on,
        permissions,
        env,
        concurrency,
        timeout_minutes,
        stop_time,
        engine,
        tools,
        network,
        sandbox,
        safe_outputs,
        safe_inputs,
        imports,
        custom_jobs,
        labels,
        rate_limit,
        manual_approval,
        lock_for_agent,
        ai_reaction,
        command,
        features,
        runs_on,
        strict,
        github_token,
        stop_after,
        plugins,
        cache_memory,
        repo_memory,
        runtimes,
        agent,
        project,
        body: merged.body,
        fingerprint: merged.fingerprint,
        import_paths: merged.import_paths,
    };

    let diagnostics = sink.into_result()?;
    let warnings = diagnostics.into_iter().filter(|d| !d.is_error()).collect();
    Ok(ValidationReport { spec, warnings })
}

fn deserialize_field<T: serde::de::DeserializeOwned>(
    mapping: &Mapping,
    key: &str,
    file: &Path,
    sink: &mut DiagnosticSink,
) -> Option<T> {
    let value = mapping.get(Value::String(key.to_string()))?;
    match serde_yaml::from_value::<T>(value.clone()) {
        Ok(v) => Some(v),
        Err(e) => {
            sink.push(
                Diagnostic::error(file, format!("invalid `{key}`: {e}")).with_field_path(key),
            );
            None
        }
    }
}

fn get_str<'a>(mapping: &'a Mapping, key: &str) -> Option<&'a str> {
    mapping.get(Value::String(key.to_string())).and_then(Value::as_str)
}

fn get_bool(mapping: &Mapping, key: &str) -> Option<bool> {
    mapping.get(Value::String(key.to_string())).and_then(Value::as_bool)
}

fn get_u32(mapping: &Mapping, key: &str) -> Option<u32> {
    mapping
        .get(Value::String(key.to_string()))
        .and_then(Value::as_u64)
        .map(|v| v as u32)
}

fn get_string_seq(mapping: &Mapping, key: &str) -> Vec<String> {
    mapping
        .get(Value::String(key.to_string()))
        .and_then(Value::as_sequence)
        .map(|seq| seq.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

fn get_string_map(mapping: &Mapping, key: &str) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    if let Some(Value::Mapping(m)) = mapping.get(Value::String(key.to_string())) {
        for (k, v) in m {
            if let (Some(k), Some(v)) = (k.as_str(), v.as_str()) {
                out.insert(k.to_string(), v.to_string());
            }
        }
    }
    out
}

fn get_bool_map(mapping: &Mapping, key: &str) -> IndexMap<String, bool> {
    let mut out = IndexMap::new();
    if let Some(Value::Mapping(m)) = mapping.get(Value::String(key.to_string())) {
        for (k, v) in m {
            if let (Some(k), Some(v)) = (k.as_str(), v.as_bool()) {
                out.insert(k.to_string(), v);
            }
        }
    }
    out
}

fn get_job_map(mapping: &Mapping, key: &str) -> IndexMap<String, Value> {
    let mut out = IndexMap::new();
    if let Some(Value::Mapping(m)) = mapping.get(Value::String(key.to_string())) {
        for (k, v) in m {
            if let Some(k) = k.as_str() {
                out.insert(k.to_string(), v.clone());
            }
        }
    }
    out
}

fn validate_labels(labels: &[String], file: &Path, sink: &mut DiagnosticSink) {
    for label in labels {
        if label.trim().is_empty() {
            sink.push(
                Diagnostic::error(file, "labels entries must be non-empty after trimming")
                    .with_field_path("labels"),
            );
        } else if label != label.trim() {
            sink.push(
                Diagnostic::warning(file, format!("label '{label}' has leading/trailing whitespace"))
                    .with_field_path("labels"),
            );
        }
    }
}

/// Sandbox modes are mutually exclusive (spec invariant 7).
fn validate_sandbox_exclusivity(sandbox: &SandboxConfig, file: &Path, sink: &mut DiagnosticSink) {
    if sandbox.srt && sandbox.awf {
        sink.push(
            Diagnostic::error(file, "sandbox.srt and sandbox.awf cannot both be enabled")
                .with_field_path("sandbox")
                .with_remediation("choose exactly one of srt or awf"),
        );
    }
}

/// A job's `needs` entries must resolve to another declared job name, or to
/// one of the built-in pipeline jobs emitted unconditionally by C10.
const BUILTIN_JOB_NAMES: &[&str] = &[
    "pre_activation",
    "activation",
    "agent",
    "safe_outputs",
    "detection",
    "push_repo_memory",
    "update_cache_memory",
    "conclusion",
];

fn validate_job_references(custom_jobs: &IndexMap<String, Value>, file: &Path, sink: &mut DiagnosticSink) {
    for (job_name, job_value) in custom_jobs {
        let Some(needs) = job_value
            .as_mapping()
            .and_then(|m| m.get(Value::String("needs".to_string())))
        else {
            continue;
        };
        let referenced: Vec<String> = match needs {
            Value::String(s) => vec![s.clone()],
            Value::Sequence(seq) => seq.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
            _ => Vec::new(),
        };
        for dep in referenced {
            if dep == *job_name {
                sink.push(
                    Diagnostic::error(file, format!("job '{job_name}' cannot depend on itself"))
                        .with_field_path(format!("jobs.{job_name}.needs")),
                );
            } else if !custom_jobs.contains_key(&dep) && !BUILTIN_JOB_NAMES.contains(&dep.as_str()) {
                sink.push(
                    Diagnostic::error(
                        file,
                        format!("job '{job_name}' needs unknown job '{dep}'"),
                    )
                    .with_field_path(format!("jobs.{job_name}.needs")),
                );
            }
        }
    }
}

/// Strict mode + a custom (non-ecosystem-tag) domain + an engine lacking LLM
/// gateway support is an error naming the domain and the missing capability
/// (spec §4.4 scenario: strict custom-domain rejection).
fn validate_network_capability(
    engine_id: EngineId,
    strict: bool,
    network: &NetworkPolicy,
    file: &Path,
    sink: &mut DiagnosticSink,
) {
    if !strict || !network.firewall {
        return;
    }
    let known_tags = ["defaults", "python", "node", "github", "dotnet", "rust", "go", "containers"];
    let custom_domains: Vec<&String> = network
        .allowed
        .iter()
        .filter(|d| !known_tags.contains(&d.as_str()))
        .collect();
    if custom_domains.is_empty() {
        return;
    }
    let engine = engine_for(engine_id);
    if !engine.capabilities().supports_llm_gateway {
        let domain = custom_domains[0];
        sink.push(
            Diagnostic::error(
                file,
                format!(
                    "strict mode: domain '{domain}' requires an LLM gateway, but engine '{}' does not support one",
                    engine.display_name()
                ),
            )
            .with_field_path("network.allowed")
            .with_remediation("choose an engine with LLM gateway support, or remove the custom domain"),
        );
    }
}

/// Warn (strict: error) when a declared `engine.*` field isn't honored by
/// the selected engine (spec §4.4/§4.5: unsupported fields degrade rather
/// than silently vanish).
fn validate_engine_capability_caps(
    engine_id: EngineId,
    engine_config: &EngineConfig,
    file: &Path,
    sink: &mut DiagnosticSink,
) {
    let caps = engine_for(engine_id).capabilities();
    if engine_config.max_turns.is_some() && !caps.supports_max_turns {
        sink.push(
            Diagnostic::warning(
                file,
                format!("engine '{engine_id}' does not support `engine.max_turns`; it will be ignored"),
            )
            .with_field_path("engine.max_turns"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use awc_core::source::SourceDocument;

    fn merged_from(yaml: &str, body: &str) -> MergeOutput {
        let doc = SourceDocument::leaf("workflow.md", serde_yaml::from_str(yaml).unwrap(), body);
        awc_merge::merge(&doc)
    }

    #[test]
    fn minimal_workflow_validates() {
        let merged = merged_from("engine:\n  id: copilot\n", "hello");
        let report = validate(merged, "workflow.md").unwrap();
        assert_eq!(report.spec.engine.id, Some(EngineId::Copilot));
    }

    #[test]
    fn newly_recognized_top_level_keys_do_not_trigger_unknown_key_rejection() {
        let merged = merged_from(
            "engine:\n  id: copilot\nstop-after: \"+48h\"\nplugins: []\ncache-memory: true\nrepo-memory: true\nruntimes: {}\nagent: {}\nproject: {}\n",
            "hello",
        );
        let report = validate(merged, "workflow.md").unwrap();
        assert_eq!(report.spec.stop_after.as_deref(), Some("+48h"));
        assert!(report.spec.cache_memory.is_some());
        assert!(report.spec.repo_memory.is_some());
    }

    #[test]
    fn bare_scalar_engine_shorthand_validates() {
        let merged = merged_from("engine: copilot\n", "hello");
        let report = validate(merged, "workflow.md").unwrap();
        assert_eq!(report.spec.engine.id, Some(EngineId::Copilot));
    }

    #[test]
    fn unknown_top_level_key_is_rejected() {
        let merged = merged_from("engine:\n  id: copilot\nbogus-field: 1\n", "hello");
        let err = validate(merged, "workflow.md").unwrap_err();
        match err {
            CompileError::Diagnostics(diags) => {
                assert!(diags.iter().any(|d| d.message.contains("bogus-field")));
            }
            other => panic!("expected Diagnostics, got {other:?}"),
        }
    }

    #[test]
    fn strict_custom_domain_on_copilot_is_rejected() {
        let merged = merged_from(
            "strict: true\nengine:\n  id: copilot\nnetwork:\n  firewall: true\n  allowed: [example.com]\n",
            "hello",
        );
        let err = validate(merged, "workflow.md").unwrap_err();
        match err {
            CompileError::Diagnostics(diags) => {
                assert!(diags
                    .iter()
                    .any(|d| d.message.contains("example.com") && d.message.contains("LLM gateway")));
            }
            other => panic!("expected Diagnostics, got {other:?}"),
        }
    }

    #[test]
    fn both_sandbox_modes_is_an_error() {
        let merged = merged_from(
            "engine:\n  id: claude\nsandbox:\n  srt: true\n  awf: true\n",
            "hello",
        );
        let err = validate(merged, "workflow.md").unwrap_err();
        match err {
            CompileError::Diagnostics(diags) => {
                assert!(diags.iter().any(|d| d.message.contains("mutually")
                    || d.message.contains("cannot both")));
            }
            other => panic!("expected Diagnostics, got {other:?}"),
        }
    }

    #[test]
    fn job_needing_unknown_job_is_rejected() {
        let merged = merged_from(
            "engine:\n  id: claude\njobs:\n  extra:\n    needs: [missing]\n",
            "hello",
        );
        let err = validate(merged, "workflow.md").unwrap_err();
        match err {
            CompileError::Diagnostics(diags) => {
                assert!(diags.iter().any(|d| d.message.contains("unknown job")));
            }
            other => panic!("expected Diagnostics, got {other:?}"),
        }
    }
}
