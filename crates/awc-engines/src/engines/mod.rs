mod claude;
mod codex;
mod copilot;
mod copilot_sdk;
mod custom;

pub use claude::ClaudeEngine;
pub use codex::CodexEngine;
pub use copilot::CopilotEngine;
pub use copilot_sdk::CopilotSdkEngine;
pub use custom::CustomEngine;
