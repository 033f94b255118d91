//! C6 — Sandbox and network policy resolver (spec §4.6).
//!
//! Takes the validated `NetworkPolicy`/`SandboxConfig` (mutual exclusivity
//! and capability gating already checked by C4) and turns them into the
//! concrete, sorted domain/mount sets the job-graph and MCP layers render.
//! Pure and total: every input reaching this stage is already known-valid.

use awc_core::network::{EcosystemTag, NetworkPolicy, ResolvedDomains, SandboxConfig, SandboxMode};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxResolution {
    pub mode: SandboxMode,
    pub domains: ResolvedDomains,
    /// Lexicographically sorted, deduplicated mount specs (spec §9
    /// "Deterministic emission").
    pub mounts: Vec<String>,
    /// Whether agent traffic routes through an LLM gateway (spec §4.6: "the
    /// firewall keeps egress closed except through the gateway when one is
    /// available").
    pub gateway_enabled: bool,
}

pub fn resolve(network: &NetworkPolicy, sandbox: &SandboxConfig, engine_supports_gateway: bool) -> SandboxResolution {
    let mode = if sandbox.srt {
        SandboxMode::Srt
    } else if sandbox.awf {
        SandboxMode::Awf
    } else if network.firewall {
        // Firewall on, neither mode picked explicitly: AWF is the fallback
        // (spec §4.6: "if firewall is enabled and SRT is not selected, AWF
        // is chosen").
        SandboxMode::Awf
    } else {
        SandboxMode::None
    };

    let domains = resolve_domains(network);

    let mut mounts: BTreeSet<String> = sandbox.mounts.iter().cloned().collect();
    let mounts: Vec<String> = mounts.drain().collect();

    let gateway_enabled = network.firewall && engine_supports_gateway;

    SandboxResolution {
        mode,
        domains,
        mounts,
        gateway_enabled,
    }
}

/// Union of every ecosystem tag's fixed domains with the literal domains
/// declared directly, always including `defaults` when the firewall is on
/// (spec §4.6: "defaults is implicitly present whenever the firewall is
/// engaged, so core GitHub connectivity never needs spelling out").
fn resolve_domains(network: &NetworkPolicy) -> ResolvedDomains {
    let mut allowed = BTreeSet::new();
    let mut blocked: BTreeSet<String> = network.blocked.iter().cloned().collect();

    if network.firewall {
        for domain in EcosystemTag::Defaults.domains() {
            allowed.insert(domain.to_string());
        }
    }

    for entry in &network.allowed {
        match parse_ecosystem_tag(entry) {
            Some(tag) => {
                for domain in tag.domains() {
                    allowed.insert(domain.to_string());
                }
            }
            None => {
                allowed.insert(entry.clone());
            }
        }
    }

    // Blocked always wins over allowed (spec §4.6: explicit blocks are a
    // floor, not a suggestion).
    for domain in &blocked {
        allowed.remove(domain);
    }
    blocked.retain(|d| !allowed.contains(d));

    ResolvedDomains {
        allowed,
        blocked,
        bypass: network.wildcard,
    }
}

fn parse_ecosystem_tag(s: &str) -> Option<EcosystemTag> {
    match s {
        "defaults" => Some(EcosystemTag::Defaults),
        "python" => Some(EcosystemTag::Python),
        "node" => Some(EcosystemTag::Node),
        "github" => Some(EcosystemTag::GitHub),
        "dotnet" => Some(EcosystemTag::Dotnet),
        "rust" => Some(EcosystemTag::Rust),
        "go" => Some(EcosystemTag::Go),
        "containers" => Some(EcosystemTag::Containers),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_modes_unset_resolves_to_none() {
        let resolution = resolve(&NetworkPolicy::default(), &SandboxConfig::default(), true);
        assert_eq!(resolution.mode, SandboxMode::None);
    }

    #[test]
    fn srt_takes_precedence_when_declared() {
        let sandbox = SandboxConfig {
            srt: true,
            ..SandboxConfig::default()
        };
        let resolution = resolve(&NetworkPolicy::default(), &sandbox, true);
        assert_eq!(resolution.mode, SandboxMode::Srt);
    }

    #[test]
    fn firewall_without_explicit_mode_falls_back_to_awf() {
        let network = NetworkPolicy {
            firewall: true,
            ..NetworkPolicy::default()
        };
        let resolution = resolve(&network, &SandboxConfig::default(), true);
        assert_eq!(resolution.mode, SandboxMode::Awf);
    }

    #[test]
    fn srt_still_wins_over_firewall_fallback() {
        let network = NetworkPolicy {
            firewall: true,
            ..NetworkPolicy::default()
        };
        let sandbox = SandboxConfig {
            srt: true,
            ..SandboxConfig::default()
        };
        let resolution = resolve(&network, &sandbox, true);
        assert_eq!(resolution.mode, SandboxMode::Srt);
    }

    #[test]
    fn ecosystem_tag_expands_to_its_fixed_domains() {
        let network = NetworkPolicy {
            firewall: true,
            allowed: vec!["python".to_string()],
            ..NetworkPolicy::default()
        };
        let resolution = resolve(&network, &SandboxConfig::default(), true);
        assert!(resolution.domains.allowed.contains("pypi.org"));
        assert!(resolution.domains.allowed.contains("github.com"));
    }

    #[test]
    fn blocked_domain_overrides_an_allowed_one() {
        let network = NetworkPolicy {
            firewall: true,
            allowed: vec!["example.com".to_string()],
            blocked: vec!["example.com".to_string()],
            ..NetworkPolicy::default()
        };
        let resolution = resolve(&network, &SandboxConfig::default(), true);
        assert!(!resolution.domains.allowed.contains("example.com"));
    }

    #[test]
    fn mounts_are_sorted_and_deduplicated() {
        let sandbox = SandboxConfig {
            mounts: vec!["/b".to_string(), "/a".to_string(), "/a".to_string()],
            ..SandboxConfig::default()
        };
        let resolution = resolve(&NetworkPolicy::default(), &sandbox, true);
        assert_eq!(resolution.mounts, vec!["/a".to_string(), "/b".to_string()]);
    }

    #[test]
    fn gateway_only_enabled_when_firewall_on_and_engine_supports_it() {
        let network = NetworkPolicy {
            firewall: true,
            ..NetworkPolicy::default()
        };
        assert!(resolve(&network, &SandboxConfig::default(), true).gateway_enabled);
        assert!(!resolve(&network, &SandboxConfig::default(), false).gateway_enabled);
        assert!(!resolve(&NetworkPolicy::default(), &SandboxConfig::default(), true).gateway_enabled);
    }
}
