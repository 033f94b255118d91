//! C3 — Merger (spec §4.3).
//!
//! Deep-merges an ordered chain of frontmatter maps into one, and
//! concatenates markdown bodies in chain order. Type-directed, following
//! the per-field-shape table in spec §4.3. The recursive map merge is
//! grounded on the teacher's `csa_config::config_merge::merge_toml_values`
//! (remove-then-reinsert per overlay key), generalized from `toml::Value`
//! to `serde_yaml::Value` and specialized for the `permissions` scope-wise
//! maximum rule spec §4.3 calls out as an exception to plain "later wins".

use awc_core::source::SourceDocument;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::LazyLock;

static XML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

pub struct MergeOutput {
    pub frontmatter: Value,
    pub body: String,
    pub import_paths: Vec<String>,
    pub fingerprint: String,
}

/// Merge a fully resolved import chain (leaves first, root last — the
/// output of `awc_imports::resolve`) into one frontmatter map and one body.
pub fn merge(root: &SourceDocument) -> MergeOutput {
    let chain = root.merge_order();

    let mut frontmatter = Value::Mapping(Mapping::new());
    let mut body_parts: Vec<String> = Vec::new();
    let mut import_paths: Vec<String> = Vec::new();

    let last_index = chain.len().saturating_sub(1);
    for (i, doc) in chain.iter().enumerate() {
        frontmatter = merge_value(&[], frontmatter, doc.frontmatter.clone());
        let is_root = i == last_index;
        let body = if is_root {
            doc.body.clone()
        } else {
            strip_xml_comments(&doc.body)
        };
        if !body.trim().is_empty() {
            body_parts.push(body);
        }
        if !is_root {
            import_paths.push(doc.path.display().to_string());
        }
    }

    let body = body_parts.join("\n\n");
    let fingerprint = fingerprint_of(&frontmatter, &body);

    MergeOutput {
        frontmatter,
        body,
        import_paths,
        fingerprint,
    }
}

fn strip_xml_comments(body: &str) -> String {
    XML_COMMENT.replace_all(body, "").to_string()
}

fn fingerprint_of(frontmatter: &Value, body: &str) -> String {
    let rendered = serde_yaml::to_string(frontmatter).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(rendered.as_bytes());
    hasher.update(body.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Type-directed merge of one field. `key_path` is the dotted path from the
/// frontmatter root, used only to special-case `permissions`.
fn merge_value(key_path: &[String], base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(b), Value::Mapping(o)) => {
            if key_path == ["permissions"] {
                Value::Mapping(merge_permissions(b, o))
            } else {
                Value::Mapping(merge_mapping(key_path, b, o))
            }
        }
        (Value::Sequence(b), Value::Sequence(o)) => Value::Sequence(concat_dedup(b, o)),
        (_, overlay) => overlay,
    }
}

fn merge_mapping(key_path: &[String], mut base: Mapping, overlay: Mapping) -> Mapping {
    for (key, overlay_val) in overlay {
        let mut child_path = key_path.to_vec();
        if let Some(k) = key.as_str() {
            child_path.push(k.to_string());
        }
        let merged_val = match base.remove(&key) {
            Some(base_val) => merge_value(&child_path, base_val, overlay_val),
            None => overlay_val,
        };
        base.insert(key, merged_val);
    }
    base
}

/// Scope-wise maximum: `read < write < admin` (spec §4.3).
fn merge_permissions(mut base: Mapping, overlay: Mapping) -> Mapping {
    for (scope, overlay_val) in overlay {
        let merged = match base.get(&scope) {
            Some(base_val) => {
                let base_level = permission_rank(base_val);
                let overlay_level = permission_rank(&overlay_val);
                if overlay_level >= base_level {
                    overlay_val
                } else {
                    base_val.clone()
                }
            }
            None => overlay_val,
        };
        base.insert(scope, merged);
    }
    base
}

fn permission_rank(v: &Value) -> u8 {
    match v.as_str() {
        Some("admin") => 3,
        Some("write") => 2,
        Some("read") => 1,
        _ => 0,
    }
}

/// Concatenate in chain order, deduplicated preserving first occurrence
/// (spec §4.3).
fn concat_dedup(base: Vec<Value>, overlay: Vec<Value>) -> Vec<Value> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(base.len() + overlay.len());
    for v in base.into_iter().chain(overlay) {
        let key = serde_yaml::to_string(&v).unwrap_or_default();
        if seen.insert(key) {
            out.push(v);
        }
    }
    out
}
