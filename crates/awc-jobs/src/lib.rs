//! C10 — Job graph builder (spec §4.10).
//!
//! Assembles the fixed pipeline jobs (`pre_activation?` → `activation` →
//! `agent` → `safe_outputs?` → `detection?` → `conclusion?`), merges in any
//! user-declared jobs, and validates the whole graph is acyclic. The
//! per-job step lists are filled in later by C11 — this stage only owns
//! shape, `needs`, conditions, and permissions.

use awc_core::job::{Job, Permissions, Step};
use awc_core::spec::WorkflowSpec;
use awc_core::{CompileError, Diagnostic};
use indexmap::IndexMap;
use serde_yaml::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;

pub struct JobGraph {
    /// Insertion order matches build order; callers that need a safe
    /// execution order should use `topological_order` instead.
    pub jobs: IndexMap<String, Job>,
}

pub fn build(
    spec: &WorkflowSpec,
    agent_permissions: Permissions,
    detection_model: &str,
    source_file: impl AsRef<Path>,
) -> Result<JobGraph, CompileError> {
    let file = source_file.as_ref();
    let mut jobs: IndexMap<String, Job> = IndexMap::new();

    let needs_pre_activation =
        spec.ai_reaction.is_some() || spec.command.is_some() || spec.rate_limit.is_some() || spec.stop_after.is_some();
    if needs_pre_activation {
        jobs.insert("pre_activation".to_string(), build_pre_activation_job(spec));
    }

    let mut activation = Job::new("activation");
    if needs_pre_activation {
        activation.needs.push("pre_activation".to_string());
    }
    activation
        .outputs
        .0
        .insert("should_run".to_string(), "${{ steps.check.outputs.should_run }}".to_string());
    jobs.insert("activation".to_string(), activation);

    let mut agent = Job::new("agent");
    agent.needs.push("activation".to_string());
    agent.permissions = Some(agent_permissions);
    agent.if_condition = Some("needs.activation.outputs.should_run == 'true'".to_string());
    if let Some(runs_on) = &spec.runs_on {
        agent.runs_on = runs_on.clone();
    }
    if let Some(minutes) = spec.timeout_minutes {
        agent.env.insert("GH_AW_TIMEOUT_MINUTES".to_string(), minutes.to_string());
    }
    jobs.insert("agent".to_string(), agent);

    let has_safe_outputs = !spec.safe_outputs.is_empty();
    if has_safe_outputs {
        let mut safe_outputs_job = Job::new("safe_outputs");
        safe_outputs_job.needs.push("agent".to_string());
        safe_outputs_job.if_condition =
            Some("always() && !cancelled() && needs.agent.result == 'success'".to_string());
        jobs.insert("safe_outputs".to_string(), safe_outputs_job);
    }

    if spec.safe_outputs.threat_detection_enabled {
        let mut detection_job = Job::new("detection");
        detection_job.needs.push("agent".to_string());
        detection_job.if_condition = Some("always() && !cancelled()".to_string());
        detection_job
            .env
            .insert("GH_AW_DETECTION_MODEL".to_string(), detection_model.to_string());
        jobs.insert("detection".to_string(), detection_job);

        // `safe_outputs` was already built above; now that `detection` exists,
        // it must also gate on it (spec §4.10: "safe_outputs gates on its
        // outputs.success == 'true' and result == 'success'").
        if let Some(safe_outputs_job) = jobs.get_mut("safe_outputs") {
            safe_outputs_job.needs.push("detection".to_string());
            safe_outputs_job.if_condition = Some(
                "always() && !cancelled() && needs.agent.result == 'success' && needs.detection.result == 'success' && needs.detection.outputs.success == 'true'"
                    .to_string(),
            );
        }
    }

    if spec.repo_memory.is_some() {
        jobs.insert("push_repo_memory".to_string(), build_push_repo_memory_job());
    }
    if spec.cache_memory.is_some() {
        jobs.insert("update_cache_memory".to_string(), build_update_cache_memory_job());
    }

    if has_safe_outputs {
        let mut conclusion = Job::new("conclusion");
        conclusion.needs.push("agent".to_string());
        if jobs.contains_key("safe_outputs") {
            conclusion.needs.push("safe_outputs".to_string());
        }
        if jobs.contains_key("detection") {
            conclusion.needs.push("detection".to_string());
        }
        conclusion.if_condition = Some("always() && !cancelled()".to_string());
        jobs.insert("conclusion".to_string(), conclusion);
    }

    for (name, value) in &spec.custom_jobs {
        let job = job_from_value(name, value);
        jobs.insert(name.clone(), job);
    }

    topological_order(&jobs, file)?;

    Ok(JobGraph { jobs })
}

fn build_pre_activation_job(spec: &WorkflowSpec) -> Job {
    let mut job = Job::new("pre_activation");
    if let Some(reaction) = &spec.ai_reaction {
        job.env.insert("GH_AW_AI_REACTION".to_string(), reaction.clone());
    }
    if let Some(command) = &spec.command {
        job.env.insert("GH_AW_COMMAND".to_string(), command.clone());
    }
    if spec.rate_limit.is_some() {
        job.env.insert("GH_AW_RATE_LIMIT_CHECK".to_string(), "true".to_string());
    }
    if let Some(stop_after) = &spec.stop_after {
        job.env.insert("GH_AW_STOP_AFTER".to_string(), stop_after.clone());
    }
    job
}

fn build_push_repo_memory_job() -> Job {
    let mut job = Job::new("push_repo_memory");
    job.needs.push("agent".to_string());
    job.if_condition = Some("always() && !cancelled() && needs.agent.result == 'success'".to_string());
    job.steps.push(Step::run(
        "Push repo memory",
        "gh-aw push-repo-memory --workspace \"$GH_AW_WORKSPACE\"",
    ));
    job
}

fn build_update_cache_memory_job() -> Job {
    let mut job = Job::new("update_cache_memory");
    job.needs.push("agent".to_string());
    job.if_condition = Some("always() && !cancelled() && needs.agent.result == 'success'".to_string());
    job.steps.push(Step::run(
        "Update cache memory",
        "gh-aw update-cache-memory --workspace \"$GH_AW_WORKSPACE\"",
    ));
    job
}

fn job_from_value(name: &str, value: &Value) -> Job {
    let mut job = Job::new(name);
    let Some(mapping) = value.as_mapping() else {
        return job;
    };

    if let Some(needs) = mapping.get(Value::String("needs".to_string())) {
        job.needs = match needs {
            Value::String(s) => vec![s.clone()],
            Value::Sequence(seq) => seq.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
            _ => Vec::new(),
        };
    }
    if let Some(Value::String(cond)) = mapping.get(Value::String("if".to_string())) {
        job.if_condition = Some(cond.clone());
    }
    if let Some(Value::String(runs_on)) = mapping.get(Value::String("runs-on".to_string())) {
        job.runs_on = runs_on.clone();
    }
    if let Some(Value::String(container)) = mapping.get(Value::String("container".to_string())) {
        job.container = Some(container.clone());
    }
    if let Some(Value::Mapping(env)) = mapping.get(Value::String("env".to_string())) {
        for (k, v) in env {
            if let (Some(k), Some(v)) = (k.as_str(), v.as_str()) {
                job.env.insert(k.to_string(), v.to_string());
            }
        }
    }
    if let Some(Value::Mapping(services)) = mapping.get(Value::String("services".to_string())) {
        for (k, v) in services {
            if let Some(k) = k.as_str() {
                job.services.insert(k.to_string(), v.clone());
            }
        }
    }

    job
}

/// Kahn's-algorithm topological sort over the job-name dependency graph.
/// Returns the sorted names, or `CompileError::Topology` if a cycle exists
/// or a `needs` entry names a job that was never declared (the latter
/// should already have been rejected by C4, but this stage is the one with
/// the complete, merged job set and re-checks defensively).
fn topological_order(jobs: &IndexMap<String, Job>, file: &Path) -> Result<Vec<String>, CompileError> {
    let mut in_degree: HashMap<&str, usize> = jobs.keys().map(|k| (k.as_str(), 0)).collect();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for job in jobs.values() {
        for dep in &job.needs {
            if !jobs.contains_key(dep) {
                return Err(CompileError::Topology(
                    Diagnostic::error(file, format!("job '{}' needs unknown job '{dep}'", job.name))
                        .with_field_path(format!("jobs.{}.needs", job.name)),
                ));
            }
            dependents.entry(dep.as_str()).or_default().push(job.name.as_str());
            *in_degree.get_mut(job.name.as_str()).unwrap() += 1;
        }
    }

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(name, _)| *name)
        .collect();
    let mut sorted_queue: Vec<&str> = queue.iter().copied().collect();
    sorted_queue.sort();
    queue = sorted_queue.into();

    let mut order = Vec::with_capacity(jobs.len());
    let mut visited: HashSet<&str> = HashSet::new();
    while let Some(name) = queue.pop_front() {
        if !visited.insert(name) {
            continue;
        }
        order.push(name.to_string());
        if let Some(next) = dependents.get(name) {
            let mut next = next.clone();
            next.sort();
            for dependent in next {
                let degree = in_degree.get_mut(dependent).unwrap();
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(dependent);
                }
            }
        }
    }

    if order.len() != jobs.len() {
        return Err(CompileError::Topology(
            Diagnostic::error(file, "job graph contains a dependency cycle").with_field_path("jobs"),
        ));
    }

    Ok(order)
}
