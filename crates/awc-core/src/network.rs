//! Network and sandbox policy types (spec §4.6 C6).

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A named shorthand for a fixed domain set (GLOSSARY "Ecosystem tag").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EcosystemTag {
    Defaults,
    Python,
    Node,
    GitHub,
    Dotnet,
    Rust,
    Go,
    Containers,
}

impl EcosystemTag {
    /// Fixed domain expansion. Sorted on construction by the resolver, not
    /// here — this only states membership (spec §4.6).
    pub fn domains(&self) -> &'static [&'static str] {
        match self {
            EcosystemTag::Defaults => &["github.com", "api.github.com", "objects.githubusercontent.com"],
            EcosystemTag::Python => &["pypi.org", "files.pythonhosted.org"],
            EcosystemTag::Node => &["registry.npmjs.org"],
            EcosystemTag::GitHub => &["github.com", "api.github.com", "raw.githubusercontent.com"],
            EcosystemTag::Dotnet => &["api.nuget.org", "nuget.org"],
            EcosystemTag::Rust => &["crates.io", "static.crates.io", "index.crates.io"],
            EcosystemTag::Go => &["proxy.golang.org", "sum.golang.org"],
            EcosystemTag::Containers => &["registry-1.docker.io", "ghcr.io"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkPolicy {
    #[serde(default)]
    pub firewall: bool,
    /// Ecosystem tags and/or explicit domains, in declaration order (union
    /// semantics are resolved by `awc-sandbox`, not stored here).
    #[serde(default)]
    pub allowed: Vec<String>,
    /// `true` iff the wildcard (`*`) bypass domain is present.
    #[serde(default)]
    pub wildcard: bool,
    #[serde(default)]
    pub blocked: Vec<String>,
}

/// Resolved, deduplicated, sorted domain set — the output of C6, not an
/// input type. Kept here so `awc-jobs`/`awc-mcp` can consume it without
/// depending on `awc-sandbox`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedDomains {
    pub allowed: BTreeSet<String>,
    pub blocked: BTreeSet<String>,
    pub bypass: bool,
}

/// Exactly one of {none, SRT, AWF} — mutually exclusive (spec invariant 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SandboxMode {
    None,
    Srt,
    Awf,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SandboxConfig {
    #[serde(default = "default_agent_sandbox")]
    pub agent: bool,
    #[serde(default)]
    pub srt: bool,
    #[serde(default)]
    pub awf: bool,
    #[serde(default)]
    pub mounts: Vec<String>,
}

fn default_agent_sandbox() -> bool {
    true
}

impl Default for SandboxMode {
    fn default() -> Self {
        SandboxMode::None
    }
}
