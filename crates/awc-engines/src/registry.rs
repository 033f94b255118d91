//! Closed registry mapping `EngineId` to its `Engine` implementation (spec
//! §4.5). Adding an engine means adding one arm here and one module under
//! `engines/`; nothing else in the crate enumerates engines by hand.

use awc_core::EngineId;

use crate::engine_trait::Engine;
use crate::engines::{ClaudeEngine, CodexEngine, CopilotEngine, CopilotSdkEngine, CustomEngine};

pub fn engine_for(id: EngineId) -> Box<dyn Engine> {
    match id {
        EngineId::Copilot => Box::new(CopilotEngine),
        EngineId::CopilotSdk => Box::new(CopilotSdkEngine),
        EngineId::Claude => Box::new(ClaudeEngine),
        EngineId::Codex => Box::new(CodexEngine),
        EngineId::Custom => Box::new(CustomEngine),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_engine_id_resolves() {
        for id in EngineId::ALL {
            let engine = engine_for(id);
            assert_eq!(engine.id(), id);
        }
    }

    #[test]
    fn copilot_lacks_llm_gateway_support() {
        let engine = engine_for(EngineId::Copilot);
        assert!(!engine.capabilities().supports_llm_gateway);
    }

    #[test]
    fn copilot_sdk_and_claude_and_codex_support_llm_gateway() {
        for id in [EngineId::CopilotSdk, EngineId::Claude, EngineId::Codex] {
            let engine = engine_for(id);
            assert!(engine.capabilities().supports_llm_gateway);
        }
    }

    #[test]
    fn experimental_flag_matches_engine_id() {
        for id in EngineId::ALL {
            let engine = engine_for(id);
            assert_eq!(engine.experimental(), id.experimental());
        }
    }
}
