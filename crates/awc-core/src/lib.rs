//! Shared data model for the agentic workflow compiler.
//!
//! This crate owns the types that flow across every compiler stage
//! (`SourceDocument` → `WorkflowSpec` → `Job`) plus the diagnostic and
//! error taxonomy described in spec §7. It has no internal workspace
//! dependencies; every other `awc-*` crate depends on it.

pub mod diagnostic;
pub mod engine;
pub mod job;
pub mod network;
pub mod safe_outputs;
pub mod source;
pub mod spec;
pub mod tool;

pub use diagnostic::{CompileError, Diagnostic, Severity};
pub use engine::EngineId;
pub use job::{Job, JobOutputs, PermissionLevel, Permissions, Step};
pub use network::{EcosystemTag, NetworkPolicy, SandboxConfig, SandboxMode};
pub use safe_outputs::{SafeOutputPolicy, SafeOutputType, SafeOutputsConfig, TargetRepoRule};
pub use source::SourceDocument;
pub use spec::{EngineConfig, ToolsMap, WorkflowSpec};
pub use tool::ToolConfig;
