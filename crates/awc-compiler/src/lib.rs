//! C1→C13 orchestration (spec §5 "Pipeline"): wires every compiler stage
//! into one `compile()` entry point. Carries no process-wide state — every
//! knob a caller can set travels through `CompilerOptions`, constructed
//! fresh per call, so two `compile()` calls in the same process never share
//! mutable state (spec invariant 1: byte-identical output for identical
//! input).

use awc_core::{CompileError, Diagnostic};
use awc_imports::FsLoader;
use std::path::{Path, PathBuf};

/// Per-call knobs. Kept separate from `WorkflowSpec` because these are
/// invocation concerns (where the detection model default comes from),
/// never frontmatter the source file itself declares.
#[derive(Debug, Clone, Default)]
pub struct CompilerOptions {
    /// Overrides the engine's own `default_detection_model()` when set.
    pub detection_model_override: Option<String>,
}

/// Everything a caller needs to write the compiled workflow to disk: the
/// lock-file YAML, the sidecar prompt body, and any non-fatal warnings
/// collected along the way.
pub struct CompileOutput {
    pub lock_yaml: String,
    pub prompt_body: String,
    pub needs_interpolation: bool,
    pub warnings: Vec<Diagnostic>,
}

/// Compile one workflow source file into a `CompileOutput`. Pure given its
/// inputs: the same `source_path` contents and `options` always produce a
/// byte-identical `lock_yaml`.
pub fn compile(source_path: impl AsRef<Path>, options: &CompilerOptions) -> Result<CompileOutput, CompileError> {
    let source_path: PathBuf = source_path.as_ref().to_path_buf();

    let root = awc_imports::resolve(&source_path, Box::new(FsLoader)).map_err(CompileError::Import)?;
    let merged = awc_merge::merge(&root);
    let report = awc_validate::validate(merged, source_path.clone())?;
    let spec = report.spec;

    // C4 rejects a missing `engine.id` before returning Ok, so this is safe.
    let engine_id = spec.engine.id.expect("validated spec always carries an engine id");
    let engine = awc_engines::engine_for(engine_id);

    let sandbox_resolution = awc_sandbox::resolve(&spec.network, &spec.sandbox, engine.capabilities().supports_llm_gateway);
    let permissions = awc_permissions::compute_permissions(&spec);
    let mcp = awc_mcp::synthesize(&spec, sandbox_resolution.mode != awc_core::network::SandboxMode::None);

    let detection_model = options
        .detection_model_override
        .as_deref()
        .unwrap_or_else(|| engine.default_detection_model());
    let mut graph = awc_jobs::build(&spec, permissions, detection_model, &source_path)?;

    if let Some(agent) = graph.jobs.get_mut("agent") {
        agent.steps = awc_steps::agent_job_steps(&spec, engine.as_ref(), &mcp);
    }
    if let Some(safe_outputs_job) = graph.jobs.get_mut("safe_outputs") {
        safe_outputs_job.steps = vec![awc_steps::safe_outputs_handler_step(&spec)];
    }

    let prompt = awc_prompt::assemble(&spec);
    let lock_yaml = awc_emit::emit(&spec, &graph);

    Ok(CompileOutput {
        lock_yaml,
        prompt_body: prompt.body,
        needs_interpolation: prompt.needs_interpolation,
        warnings: report.warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_workflow(dir: &std::path::Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn minimal_workflow_compiles_to_a_lock_file_with_activation_and_agent() {
        let dir = tempdir("minimal");
        let path = write_workflow(
            &dir,
            "wf.md",
            "---\nname: hello\nengine:\n  id: copilot\n---\nSay hi\n",
        );
        let output = compile(&path, &CompilerOptions::default()).unwrap();
        assert!(output.lock_yaml.contains("activation"));
        assert!(output.lock_yaml.contains("agent"));
        assert!(output.prompt_body.contains("Say hi"));
        cleanup(dir);
    }

    #[test]
    fn missing_engine_is_rejected_with_diagnostics() {
        let dir = tempdir("missing-engine");
        let path = write_workflow(&dir, "wf.md", "---\nname: hello\n---\nbody\n");
        let err = compile(&path, &CompilerOptions::default()).unwrap_err();
        assert!(matches!(err, CompileError::Diagnostics(_)));
        cleanup(dir);
    }

    #[test]
    fn import_cycle_is_reported_as_import_error() {
        let dir = tempdir("import-cycle");
        write_workflow(&dir, "a.md", "---\nimports: [wf.md]\n---\n");
        let path = write_workflow(&dir, "wf.md", "---\nimports: [a.md]\n---\n");
        let err = compile(&path, &CompilerOptions::default()).unwrap_err();
        assert!(matches!(err, CompileError::Import(_)));
        cleanup(dir);
    }

    #[test]
    fn strict_custom_domain_on_copilot_fails_compilation() {
        let dir = tempdir("strict-custom-domain");
        let path = write_workflow(
            &dir,
            "wf.md",
            "---\nstrict: true\nengine:\n  id: copilot\nnetwork:\n  firewall: true\n  allowed: [example.com]\n---\nbody\n",
        );
        let err = compile(&path, &CompilerOptions::default()).unwrap_err();
        match err {
            CompileError::Diagnostics(diags) => {
                assert!(diags.iter().any(|d| d.message.contains("example.com")));
            }
            other => panic!("expected Diagnostics, got {other:?}"),
        }
        cleanup(dir);
    }

    #[test]
    fn threat_detection_adds_a_detection_job_using_the_engines_default_model() {
        let dir = tempdir("threat-detection");
        let path = write_workflow(
            &dir,
            "wf.md",
            "---\nengine:\n  id: claude\nsafe-outputs:\n  create-issue: true\n  threat-detection: true\n---\nbody\n",
        );
        let output = compile(&path, &CompilerOptions::default()).unwrap();
        assert!(output.lock_yaml.contains("detection"));
        cleanup(dir);
    }

    #[test]
    fn determinism_compiling_twice_yields_identical_lock_yaml() {
        let dir = tempdir("determinism");
        let path = write_workflow(
            &dir,
            "wf.md",
            "---\nname: dup\nengine:\n  id: codex\n---\nbody\n",
        );
        let first = compile(&path, &CompilerOptions::default()).unwrap();
        let second = compile(&path, &CompilerOptions::default()).unwrap();
        assert_eq!(first.lock_yaml, second.lock_yaml);
        cleanup(dir);
    }

    fn tempdir(label: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("awc-compiler-test-{}-{label}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: PathBuf) {
        let _ = std::fs::remove_dir_all(dir);
    }
}
