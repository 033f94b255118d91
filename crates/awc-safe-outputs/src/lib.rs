//! C7 — Safe-outputs normalizer (spec §4.7).
//!
//! The `safe-outputs` frontmatter block uses a shorthand surface: each
//! output type is a top-level key, `true` for "enable with defaults" or a
//! mapping for a tuned policy. This crate expands that shorthand into the
//! fully-populated `SafeOutputsConfig` every downstream component consumes.

use awc_core::diagnostic::{Diagnostic, DiagnosticSink};
use awc_core::safe_outputs::{SafeOutputPolicy, SafeOutputType, SafeOutputsConfig, TargetRepoRule};
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use std::path::Path;

const CONFIG_KEYS: &[&str] = &["github-token", "threat-detection"];

pub fn normalize(value: Option<&Value>, file: &Path, sink: &mut DiagnosticSink) -> SafeOutputsConfig {
    let Some(Value::Mapping(mapping)) = value else {
        return SafeOutputsConfig::default();
    };

    let default_github_token = get_str(mapping, "github-token").map(str::to_string);
    let mut threat_detection_enabled = get_bool(mapping, "threat-detection").unwrap_or(false);

    let mut policies: IndexMap<SafeOutputType, SafeOutputPolicy> = IndexMap::new();
    for (key, entry) in mapping {
        let Some(key_str) = key.as_str() else { continue };
        if CONFIG_KEYS.contains(&key_str) {
            continue;
        }
        let Some(output_type) = parse_output_type(key_str) else {
            sink.push(
                Diagnostic::error(file, format!("unknown safe-output type '{key_str}'"))
                    .with_field_path(format!("safe-outputs.{key_str}")),
            );
            continue;
        };

        match entry {
            Value::Bool(false) => continue,
            Value::Bool(true) => {
                policies.insert(
                    output_type,
                    SafeOutputPolicy {
                        max: output_type.default_cap(),
                        github_token: default_github_token.clone(),
                        ..SafeOutputPolicy::default()
                    },
                );
            }
            Value::Mapping(policy_map) => {
                let policy = parse_policy(output_type, policy_map, &default_github_token, file, sink);
                if policy.threat_detection {
                    threat_detection_enabled = true;
                }
                policies.insert(output_type, policy);
            }
            _ => {
                sink.push(
                    Diagnostic::error(file, format!("safe-outputs.{key_str} must be `true` or a mapping"))
                        .with_field_path(format!("safe-outputs.{key_str}")),
                );
            }
        }
    }

    apply_project_token_precedence(&mut policies, &default_github_token);

    SafeOutputsConfig {
        policies,
        default_github_token,
        threat_detection_enabled,
    }
}

fn parse_policy(
    output_type: SafeOutputType,
    mapping: &Mapping,
    default_github_token: &Option<String>,
    file: &Path,
    sink: &mut DiagnosticSink,
) -> SafeOutputPolicy {
    let max = get_u32(mapping, "max").unwrap_or_else(|| output_type.default_cap());
    let labels = get_string_seq(mapping, "labels");
    let assignees = get_string_seq(mapping, "assignees");
    let title_prefix = get_str(mapping, "title-prefix").map(str::to_string);
    let footer = get_bool(mapping, "footer").unwrap_or(true);
    let github_token = get_str(mapping, "github-token")
        .map(str::to_string)
        .or_else(|| default_github_token.clone());
    let threat_detection = get_bool(mapping, "threat-detection").unwrap_or(false);
    let continue_on_error = get_bool(mapping, "continue-on-error").unwrap_or(false);
    let target_repo = parse_target_repo(output_type, mapping, file, sink);

    SafeOutputPolicy {
        max,
        target_repo,
        labels,
        assignees,
        title_prefix,
        footer,
        github_token,
        threat_detection,
        continue_on_error,
    }
}

/// `target-repo: "*"` is rejected outright (spec §4.7: "wildcards are
/// forbidden" — a workflow must name the repos it may touch).
fn parse_target_repo(
    output_type: SafeOutputType,
    mapping: &Mapping,
    file: &Path,
    sink: &mut DiagnosticSink,
) -> TargetRepoRule {
    match mapping.get(Value::String("target-repo".to_string())) {
        None => TargetRepoRule::CurrentRepoOnly,
        Some(Value::String(s)) if s == "*" => {
            sink.push(
                Diagnostic::error(file, "target-repo wildcard '*' is not allowed")
                    .with_field_path(format!("safe-outputs.{}.target-repo", output_type.as_kebab_case()))
                    .with_remediation("name the specific repositories allowed, or omit target-repo"),
            );
            TargetRepoRule::CurrentRepoOnly
        }
        Some(Value::String(s)) if s == "none" => TargetRepoRule::None,
        Some(Value::String(s)) => TargetRepoRule::Single(s.clone()),
        Some(Value::Sequence(seq)) => {
            let repos: Vec<String> = seq.iter().filter_map(|v| v.as_str().map(str::to_string)).collect();
            if repos.iter().any(|r| r == "*") {
                sink.push(
                    Diagnostic::error(file, "target-repo wildcard '*' is not allowed in an allowlist")
                        .with_field_path(format!("safe-outputs.{}.target-repo", output_type.as_kebab_case())),
                );
                TargetRepoRule::CurrentRepoOnly
            } else {
                TargetRepoRule::Allowlist(repos)
            }
        }
        Some(_) => TargetRepoRule::CurrentRepoOnly,
    }
}

/// Project-related output types share one token: whichever declares its own
/// `github-token` first (in declaration order) wins for the others that
/// didn't set one explicitly (spec §4.7 "project token precedence").
fn apply_project_token_precedence(
    policies: &mut IndexMap<SafeOutputType, SafeOutputPolicy>,
    default_github_token: &Option<String>,
) {
    let explicit_project_token = policies
        .iter()
        .filter(|(ty, _)| ty.is_project_related())
        .find_map(|(_, policy)| policy.github_token.clone());

    let Some(project_token) = explicit_project_token.or_else(|| default_github_token.clone()) else {
        return;
    };

    for (ty, policy) in policies.iter_mut() {
        if ty.is_project_related() && policy.github_token.is_none() {
            policy.github_token = Some(project_token.clone());
        }
    }
}

fn parse_output_type(key: &str) -> Option<SafeOutputType> {
    SafeOutputType::ALL.iter().copied().find(|ty| ty.as_kebab_case() == key)
}

fn get_str<'a>(mapping: &'a Mapping, key: &str) -> Option<&'a str> {
    mapping.get(Value::String(key.to_string())).and_then(Value::as_str)
}

fn get_bool(mapping: &Mapping, key: &str) -> Option<bool> {
    mapping.get(Value::String(key.to_string())).and_then(Value::as_bool)
}

fn get_u32(mapping: &Mapping, key: &str) -> Option<u32> {
    mapping.get(Value::String(key.to_string())).and_then(Value::as_u64).map(|v| v as u32)
}

fn get_string_seq(mapping: &Mapping, key: &str) -> Vec<String> {
    mapping
        .get(Value::String(key.to_string()))
        .and_then(Value::as_sequence)
        .map(|seq| seq.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn file() -> PathBuf {
        PathBuf::from("workflow.md")
    }

    #[test]
    fn boolean_shorthand_expands_to_default_policy() {
        let value: Value = serde_yaml::from_str("create-issue: true").unwrap();
        let mut sink = DiagnosticSink::new(false);
        let config = normalize(Some(&value), &file(), &mut sink);
        assert!(!sink.has_errors());
        let policy = config.policies.get(&SafeOutputType::CreateIssue).unwrap();
        assert_eq!(policy.max, 1);
    }

    #[test]
    fn mapping_form_overrides_default_cap() {
        let value: Value = serde_yaml::from_str("add-labels:\n  max: 3\n").unwrap();
        let mut sink = DiagnosticSink::new(false);
        let config = normalize(Some(&value), &file(), &mut sink);
        let policy = config.policies.get(&SafeOutputType::AddLabels).unwrap();
        assert_eq!(policy.max, 3);
    }

    #[test]
    fn false_shorthand_is_not_enabled() {
        let value: Value = serde_yaml::from_str("create-issue: false").unwrap();
        let mut sink = DiagnosticSink::new(false);
        let config = normalize(Some(&value), &file(), &mut sink);
        assert!(config.policies.is_empty());
    }

    #[test]
    fn wildcard_target_repo_is_rejected() {
        let value: Value = serde_yaml::from_str("create-issue:\n  target-repo: \"*\"\n").unwrap();
        let mut sink = DiagnosticSink::new(false);
        normalize(Some(&value), &file(), &mut sink);
        assert!(sink.has_errors());
    }

    #[test]
    fn unknown_output_type_is_rejected() {
        let value: Value = serde_yaml::from_str("frobnicate-issue: true").unwrap();
        let mut sink = DiagnosticSink::new(false);
        normalize(Some(&value), &file(), &mut sink);
        assert!(sink.has_errors());
    }

    #[test]
    fn project_token_cascades_from_first_explicit_declaration() {
        let value: Value = serde_yaml::from_str(
            "create-project:\n  github-token: ${{ secrets.PROJECT_TOKEN }}\nupdate-project: true\n",
        )
        .unwrap();
        let mut sink = DiagnosticSink::new(false);
        let config = normalize(Some(&value), &file(), &mut sink);
        let update_policy = config.policies.get(&SafeOutputType::UpdateProject).unwrap();
        assert_eq!(
            update_policy.github_token.as_deref(),
            Some("${{ secrets.PROJECT_TOKEN }}")
        );
    }

    #[test]
    fn threat_detection_flag_on_any_policy_sets_global_flag() {
        let value: Value = serde_yaml::from_str("create-issue:\n  threat-detection: true\n").unwrap();
        let mut sink = DiagnosticSink::new(false);
        let config = normalize(Some(&value), &file(), &mut sink);
        assert!(config.threat_detection_enabled);
    }
}
