//! The closed set of top-level frontmatter keys (spec §3/§6). Anything else
//! is rejected, with a "did you mean" suggestion when the unknown key is
//! close to a known one (likely a typo).

use awc_core::diagnostic::{Diagnostic, DiagnosticSink};
use serde_yaml::Mapping;
use std::path::Path;

use crate::suggest::suggest_closest;

pub const KNOWN_TOP_LEVEL_KEYS: &[&str] = &[
    "name",
    "on",
    "permissions",
    "env",
    "concurrency",
    "timeout-minutes",
    "stop-time",
    "engine",
    "tools",
    "network",
    "sandbox",
    "safe-outputs",
    "safe-inputs",
    "imports",
    "jobs",
    "labels",
    "rate-limit",
    "manual-approval",
    "lock-for-agent",
    "ai-reaction",
    "command",
    "features",
    "runs-on",
    "strict",
    "github-token",
    "stop-after",
    "plugins",
    "cache-memory",
    "repo-memory",
    "runtimes",
    "agent",
    "project",
];

pub fn check_unknown_keys(mapping: &Mapping, file: &Path, sink: &mut DiagnosticSink) {
    for key in mapping.keys() {
        let Some(key) = key.as_str() else { continue };
        if KNOWN_TOP_LEVEL_KEYS.contains(&key) {
            continue;
        }
        let mut diag = Diagnostic::error(file, format!("unknown top-level key '{key}'")).with_field_path(key);
        if let Some(suggestion) = suggest_closest(key, KNOWN_TOP_LEVEL_KEYS) {
            diag = diag.with_remediation(format!("did you mean '{suggestion}'?"));
        }
        sink.push(diag);
    }
}
