//! The polymorphic engine layer (spec §4.5 C5): a closed registry of AI
//! agent engines, each describing its own capabilities, installation and
//! execution steps, MCP config rendering, and tool-argument encoding.

mod capabilities;
mod engine_trait;
mod engines;
mod mcp_render;
mod registry;
mod tool_encoding;

pub use capabilities::EngineCapabilities;
pub use engine_trait::Engine;
pub use engines::{ClaudeEngine, CodexEngine, CopilotEngine, CopilotSdkEngine, CustomEngine};
pub use mcp_render::{render_json, render_toml, McpServerEntry};
pub use registry::engine_for;
pub use tool_encoding::ToolEncoding;
