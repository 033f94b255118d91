//! `EngineCapabilities` (spec §3, §4.5).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineCapabilities {
    pub supports_tool_allowlist: bool,
    pub supports_http_mcp: bool,
    pub supports_max_turns: bool,
    pub supports_max_tokens: bool,
    pub supports_max_iterations: bool,
    pub supports_firewall: bool,
    pub supports_plugins: bool,
    pub supports_llm_gateway: bool,
    pub supports_web_fetch: bool,
    pub supports_web_search: bool,
}
