//! C12 — Deterministic YAML emission (spec §4.12, invariant 1: "compiling
//! the same source twice yields byte-identical output").
//!
//! Builds the final workflow document key-by-key in a fixed order rather
//! than deriving it from `#[derive(Serialize)]` on `WorkflowSpec`/`Job` —
//! those types carry fields irrelevant to the rendered document (the
//! merged body, the fingerprint) and the derive's field order wouldn't
//! match the GitHub Actions convention this emits.

use awc_core::job::{Job, Permissions, Step};
use awc_core::spec::WorkflowSpec;
use awc_jobs::JobGraph;
use serde_yaml::{Mapping, Value};

/// Render the comment header (source fingerprint, import chain) plus the
/// full workflow document as one YAML string.
pub fn emit(spec: &WorkflowSpec, graph: &JobGraph) -> String {
    let mut header = String::new();
    header.push_str("# This file is generated. Do not edit by hand.\n");
    header.push_str(&format!("# Source fingerprint: {}\n", spec.fingerprint));
    if !spec.import_paths.is_empty() {
        header.push_str("# Imports:\n");
        for path in &spec.import_paths {
            header.push_str(&format!("#   - {path}\n"));
        }
    }

    let doc = build_document(spec, graph);
    let rendered = serde_yaml::to_string(&doc).unwrap_or_default();
    format!("{header}{rendered}")
}

fn build_document(spec: &WorkflowSpec, graph: &JobGraph) -> Value {
    let mut doc = Mapping::new();
    insert(&mut doc, "name", str_value(&spec.name));
    insert(&mut doc, "on", spec.on.clone());

    match &spec.permissions {
        Value::Null => {}
        other => insert(&mut doc, "permissions", other.clone()),
    }

    if !spec.env.is_empty() {
        insert(&mut doc, "env", sorted_string_map(&spec.env));
    }
    if let Some(concurrency) = &spec.concurrency {
        insert(&mut doc, "concurrency", concurrency.clone());
    }

    let mut jobs = Mapping::new();
    for (name, job) in &graph.jobs {
        jobs.insert(str_value(name), job_value(job));
    }
    insert(&mut doc, "jobs", Value::Mapping(jobs));

    Value::Mapping(doc)
}

fn job_value(job: &Job) -> Value {
    let mut map = Mapping::new();
    insert(&mut map, "runs-on", str_value(&job.runs_on));
    if !job.needs.is_empty() {
        insert(
            &mut map,
            "needs",
            Value::Sequence(job.needs.iter().map(|n| str_value(n)).collect()),
        );
    }
    if let Some(cond) = &job.if_condition {
        insert(&mut map, "if", str_value(cond));
    }
    if let Some(permissions) = &job.permissions {
        insert(&mut map, "permissions", permissions_value(permissions));
    }
    if let Some(container) = &job.container {
        insert(&mut map, "container", str_value(container));
    }
    if !job.services.0.is_empty() {
        let mut services = Mapping::new();
        for (name, value) in &job.services.0 {
            services.insert(str_value(name), value.clone());
        }
        insert(&mut map, "services", Value::Mapping(services));
    }
    if !job.env.is_empty() {
        insert(&mut map, "env", sorted_string_map(&job.env));
    }
    if let Some(concurrency) = &job.concurrency {
        insert(&mut map, "concurrency", concurrency.clone());
    }
    if !job.outputs.0.is_empty() {
        insert(&mut map, "outputs", sorted_string_map(&job.outputs.0));
    }
    insert(
        &mut map,
        "steps",
        Value::Sequence(job.steps.iter().map(step_value).collect()),
    );
    Value::Mapping(map)
}

fn step_value(step: &Step) -> Value {
    let mut map = Mapping::new();
    insert(&mut map, "name", str_value(&step.name));
    if let Some(cond) = &step.if_condition {
        insert(&mut map, "if", str_value(cond));
    }
    if let Some(uses) = &step.uses {
        insert(&mut map, "uses", str_value(uses));
    }
    if !step.with.is_empty() {
        let mut with = Mapping::new();
        for (key, value) in &step.with {
            with.insert(str_value(key), value.clone());
        }
        insert(&mut map, "with", Value::Mapping(with));
    }
    if let Some(run) = &step.run {
        insert(&mut map, "run", str_value(run));
    }
    if !step.env.is_empty() {
        insert(&mut map, "env", sorted_string_map(&step.env));
    }
    if step.continue_on_error {
        insert(&mut map, "continue-on-error", Value::Bool(true));
    }
    Value::Mapping(map)
}

/// `Some(empty map)` renders as an explicit `permissions: {}` (spec §4.12:
/// distinguished from the field being absent entirely).
fn permissions_value(permissions: &Permissions) -> Value {
    let mut map = Mapping::new();
    for (scope, level) in permissions.sorted() {
        map.insert(str_value(scope), str_value(level.as_str()));
    }
    Value::Mapping(map)
}

fn sorted_string_map(map: &indexmap::IndexMap<String, String>) -> Value {
    let mut entries: Vec<(&String, &String)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    let mut out = Mapping::new();
    for (k, v) in entries {
        out.insert(str_value(k), str_value(v));
    }
    Value::Mapping(out)
}

fn str_value(s: &str) -> Value {
    Value::String(s.to_string())
}

fn insert(map: &mut Mapping, key: &str, value: Value) {
    map.insert(str_value(key), value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use awc_core::job::PermissionLevel;
    use indexmap::IndexMap;

    fn graph_with(jobs: IndexMap<String, Job>) -> JobGraph {
        JobGraph { jobs }
    }

    #[test]
    fn permissions_empty_map_renders_as_explicit_braces() {
        let mut spec = WorkflowSpec::default();
        spec.name = "test".to_string();
        let mut agent = Job::new("agent");
        agent.permissions = Some(Permissions::new());
        let mut jobs = IndexMap::new();
        jobs.insert("agent".to_string(), agent);
        let rendered = emit(&spec, &graph_with(jobs));
        assert!(rendered.contains("permissions: {}"));
    }

    #[test]
    fn permissions_sorted_alphabetically_by_scope() {
        let mut spec = WorkflowSpec::default();
        spec.name = "test".to_string();
        let mut agent = Job::new("agent");
        let mut permissions = Permissions::new();
        permissions.grant("issues", PermissionLevel::Write);
        permissions.grant("contents", PermissionLevel::Read);
        agent.permissions = Some(permissions);
        let mut jobs = IndexMap::new();
        jobs.insert("agent".to_string(), agent);
        let rendered = emit(&spec, &graph_with(jobs));
        let contents_pos = rendered.find("contents").unwrap();
        let issues_pos = rendered.find("issues").unwrap();
        assert!(contents_pos < issues_pos);
    }

    #[test]
    fn header_includes_fingerprint_and_imports() {
        let mut spec = WorkflowSpec::default();
        spec.fingerprint = "deadbeef".to_string();
        spec.import_paths = vec!["shared.md".to_string()];
        let rendered = emit(&spec, &graph_with(IndexMap::new()));
        assert!(rendered.contains("deadbeef"));
        assert!(rendered.contains("shared.md"));
    }

    #[test]
    fn expression_strings_are_emitted_verbatim() {
        let mut spec = WorkflowSpec::default();
        let mut agent = Job::new("agent");
        agent.if_condition = Some("${{ needs.activation.outputs.should_run == 'true' }}".to_string());
        let mut jobs = IndexMap::new();
        jobs.insert("agent".to_string(), agent);
        let rendered = emit(&spec, &graph_with(jobs));
        assert!(rendered.contains("${{ needs.activation.outputs.should_run == 'true' }}"));
    }

    #[test]
    fn determinism_same_input_yields_identical_output() {
        let mut spec = WorkflowSpec::default();
        spec.name = "wf".to_string();
        let mut jobs = IndexMap::new();
        jobs.insert("agent".to_string(), Job::new("agent"));
        let graph = graph_with(jobs);
        assert_eq!(emit(&spec, &graph), emit(&spec, &graph));
    }
}
