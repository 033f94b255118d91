//! Job graph emission unit (spec §3 `Job`, §4.10, §4.11).

use indexmap::IndexMap;
use serde_yaml::Value;
use std::cmp::Ordering;

/// Scope-wise permission level; `Ord` gives the "maximum" merge rule of
/// spec §4.3 (`read < write < admin`) a free `max()`/`Ord::max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PermissionLevel {
    None,
    Read,
    Write,
    Admin,
}

impl PermissionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionLevel::None => "none",
            PermissionLevel::Read => "read",
            PermissionLevel::Write => "write",
            PermissionLevel::Admin => "admin",
        }
    }
}

/// Per-job GitHub token scopes. `None` (the Rust `Option`) means "omit the
/// field entirely"; `Some(empty map)` means "explicit `permissions: {}}`"
/// (spec §4.12: these two render differently).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permissions(pub IndexMap<String, PermissionLevel>);

impl Permissions {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn grant(&mut self, scope: impl Into<String>, level: PermissionLevel) {
        let scope = scope.into();
        self.0
            .entry(scope)
            .and_modify(|existing| {
                if level > *existing {
                    *existing = level;
                }
            })
            .or_insert(level);
    }

    /// Scope-wise maximum merge of two permission sets (spec §4.3).
    pub fn merged_with(&self, other: &Permissions) -> Permissions {
        let mut result = self.clone();
        for (scope, level) in &other.0 {
            result.grant(scope.clone(), *level);
        }
        result
    }

    pub fn get(&self, scope: &str) -> PermissionLevel {
        self.0.get(scope).copied().unwrap_or(PermissionLevel::None)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sorted scope/level pairs for deterministic emission (spec §9
    /// "Deterministic emission").
    pub fn sorted(&self) -> Vec<(&String, PermissionLevel)> {
        let mut pairs: Vec<_> = self.0.iter().map(|(k, v)| (k, *v)).collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        pairs
    }
}

impl PartialOrd for Permissions {
    fn partial_cmp(&self, _other: &Self) -> Option<Ordering> {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub name: String,
    pub uses: Option<String>,
    pub run: Option<String>,
    pub with: IndexMap<String, Value>,
    pub env: IndexMap<String, String>,
    pub if_condition: Option<String>,
    pub continue_on_error: bool,
}

impl Step {
    pub fn run(name: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uses: None,
            run: Some(script.into()),
            with: IndexMap::new(),
            env: IndexMap::new(),
            if_condition: None,
            continue_on_error: false,
        }
    }

    pub fn uses(name: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uses: Some(action.into()),
            run: None,
            with: IndexMap::new(),
            env: IndexMap::new(),
            if_condition: None,
            continue_on_error: false,
        }
    }

    pub fn with_if(mut self, cond: impl Into<String>) -> Self {
        self.if_condition = Some(cond.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobOutputs(pub IndexMap<String, String>);

#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub name: String,
    pub needs: Vec<String>,
    pub if_condition: Option<String>,
    pub runs_on: String,
    pub env: IndexMap<String, String>,
    pub permissions: Option<Permissions>,
    pub concurrency: Option<Value>,
    pub outputs: JobOutputs,
    pub steps: Vec<Step>,
    pub container: Option<String>,
    pub services: IndexMap<String, Value>,
}

impl Job {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            needs: Vec::new(),
            if_condition: None,
            runs_on: "ubuntu-latest".to_string(),
            env: IndexMap::new(),
            permissions: None,
            concurrency: None,
            outputs: JobOutputs::default(),
            steps: Vec::new(),
            container: None,
            services: IndexMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_merge_takes_scopewise_maximum() {
        let mut a = Permissions::new();
        a.grant("contents", PermissionLevel::Read);
        a.grant("issues", PermissionLevel::Write);

        let mut b = Permissions::new();
        b.grant("contents", PermissionLevel::Write);

        let merged = a.merged_with(&b);
        assert_eq!(merged.get("contents"), PermissionLevel::Write);
        assert_eq!(merged.get("issues"), PermissionLevel::Write);
    }

    #[test]
    fn grant_never_downgrades() {
        let mut p = Permissions::new();
        p.grant("contents", PermissionLevel::Admin);
        p.grant("contents", PermissionLevel::Read);
        assert_eq!(p.get("contents"), PermissionLevel::Admin);
    }
}
