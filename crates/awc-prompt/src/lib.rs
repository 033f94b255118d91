//! C13 — Prompt assembly (spec §4.13).
//!
//! Builds the sidecar prompt body written alongside the lock file: the
//! merged markdown (C3 already stripped XML comments from every import but
//! the root) plus one `{{#runtime-import <path>}}` marker per import, in
//! chain order, documenting provenance for anything that re-reads sources
//! at runtime. Also flags whether the body needs an interpolation pass —
//! the agent job only gets a template-render step when one is warranted.

use awc_core::spec::WorkflowSpec;
use regex::Regex;
use std::sync::LazyLock;

static CONDITIONAL_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{#if\b|\$\{\{").unwrap());

pub struct PromptAssembly {
    pub body: String,
    /// Whether the body contains `{{#if ...}}` or `${{ ... }}` markers that
    /// require a template-interpolation step before the engine runs (spec
    /// §4.13: conditional interpolation is opt-in per body content, not
    /// unconditionally present).
    pub needs_interpolation: bool,
}

pub fn assemble(spec: &WorkflowSpec) -> PromptAssembly {
    let mut body = spec.body.clone();
    if !spec.import_paths.is_empty() {
        body.push_str("\n\n<!-- runtime imports -->\n");
        for path in &spec.import_paths {
            body.push_str(&format!("{{{{#runtime-import {path}}}}}\n"));
        }
    }
    let needs_interpolation = CONDITIONAL_MARKER.is_match(&body);
    PromptAssembly { body, needs_interpolation }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imports_emit_one_runtime_import_macro_each_in_chain_order() {
        let mut spec = WorkflowSpec::default();
        spec.body = "root content".to_string();
        spec.import_paths = vec!["a.md".to_string(), "b.md".to_string()];
        let assembly = assemble(&spec);
        let a_pos = assembly.body.find("{{#runtime-import a.md}}").unwrap();
        let b_pos = assembly.body.find("{{#runtime-import b.md}}").unwrap();
        assert!(a_pos < b_pos);
    }

    #[test]
    fn no_imports_means_no_runtime_import_markers() {
        let mut spec = WorkflowSpec::default();
        spec.body = "plain body".to_string();
        let assembly = assemble(&spec);
        assert!(!assembly.body.contains("runtime-import"));
    }

    #[test]
    fn conditional_marker_flips_needs_interpolation() {
        let mut spec = WorkflowSpec::default();
        spec.body = "Hello {{#if user.is_admin}}admin{{/if}}".to_string();
        assert!(assemble(&spec).needs_interpolation);

        let mut plain = WorkflowSpec::default();
        plain.body = "Hello there".to_string();
        assert!(!assemble(&plain).needs_interpolation);
    }

    #[test]
    fn expression_marker_also_flips_needs_interpolation() {
        let mut spec = WorkflowSpec::default();
        spec.body = "Issue: ${{ github.event.issue.number }}".to_string();
        assert!(assemble(&spec).needs_interpolation);
    }
}
