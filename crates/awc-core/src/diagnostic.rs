//! Diagnostic and error taxonomy (spec §7).
//!
//! Validation runs to completion and reports every error/warning for a
//! single source, not just the first. `Diagnostic` carries enough structure
//! (file, field path, remediation hint) for a CI host to annotate a source
//! line directly, rather than a single opaque string.

use std::fmt;
use std::path::PathBuf;

/// Severity of a single diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

/// One structured diagnostic produced during compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub file: PathBuf,
    pub line: Option<u32>,
    /// Dotted path into the frontmatter, e.g. `safe-outputs.create-issue.max`.
    pub field_path: Option<String>,
    pub remediation: Option<String>,
}

impl Diagnostic {
    pub fn error(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            file: file.into(),
            line: None,
            field_path: None,
            remediation: None,
        }
    }

    pub fn warning(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            file: file.into(),
            line: None,
            field_path: None,
            remediation: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_remediation(mut self, hint: impl Into<String>) -> Self {
        self.remediation = Some(hint.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{kind}: {}: {}", self.file.display(), self.message)?;
        if let Some(path) = &self.field_path {
            write!(f, " (at `{path}`)")?;
        }
        if let Some(line) = self.line {
            write!(f, " [line {line}]")?;
        }
        if let Some(hint) = &self.remediation {
            write!(f, " — {hint}")?;
        }
        Ok(())
    }
}

/// The error kinds enumerated in spec §7, one variant per taxonomy entry.
/// Carries a fully formed `Diagnostic` so callers never have to re-derive
/// file/field-path context from a string.
#[derive(thiserror::Error, Debug)]
pub enum CompileError {
    #[error("{0}")]
    Parse(Diagnostic),

    #[error("{0}")]
    Import(Diagnostic),

    #[error("{0}")]
    Schema(Diagnostic),

    #[error("{0}")]
    Policy(Diagnostic),

    #[error("{0}")]
    Topology(Diagnostic),

    #[error("{0}")]
    Capability(Diagnostic),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One or more diagnostics accumulated to errors; see spec §7
    /// "propagation policy" — validation always reports everything.
    #[error("compilation failed with {} error(s)", .0.iter().filter(|d| d.is_error()).count())]
    Diagnostics(Vec<Diagnostic>),
}

impl CompileError {
    /// Process exit code distinguishing the error family (spec §6).
    pub fn exit_code(&self) -> i32 {
        match self {
            CompileError::Parse(_) => 2,
            CompileError::Import(_) => 3,
            CompileError::Schema(_) => 4,
            CompileError::Policy(_) => 5,
            CompileError::Topology(_) => 6,
            CompileError::Capability(_) => 7,
            CompileError::Io { .. } => 8,
            CompileError::Diagnostics(_) => 1,
        }
    }
}

/// Accumulates diagnostics across a single compilation, converting warnings
/// to errors in strict mode per spec §4.4.
#[derive(Debug, Default, Clone)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
    strict: bool,
}

impl DiagnosticSink {
    pub fn new(strict: bool) -> Self {
        Self {
            diagnostics: Vec::new(),
            strict,
        }
    }

    pub fn push(&mut self, mut diag: Diagnostic) {
        if self.strict && diag.severity == Severity::Warning {
            diag.severity = Severity::Error;
        }
        self.diagnostics.push(diag);
    }

    pub fn error(&mut self, file: impl Into<PathBuf>, message: impl Into<String>) {
        self.push(Diagnostic::error(file, message));
    }

    pub fn warning(&mut self, file: impl Into<PathBuf>, message: impl Into<String>) {
        self.push(Diagnostic::warning(file, message));
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Resolve the sink into a `Result`: `Err` iff any error-severity
    /// diagnostic was recorded (after strict-mode promotion).
    pub fn into_result(self) -> Result<Vec<Diagnostic>, CompileError> {
        if self.has_errors() {
            Err(CompileError::Diagnostics(self.diagnostics))
        } else {
            Ok(self.diagnostics)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_mode_promotes_warnings_to_errors() {
        let mut sink = DiagnosticSink::new(true);
        sink.warning("wf.md", "missing conventional permission");
        assert!(sink.has_errors());
    }

    #[test]
    fn non_strict_warnings_do_not_fail() {
        let mut sink = DiagnosticSink::new(false);
        sink.warning("wf.md", "style nit");
        assert!(!sink.has_errors());
        assert_eq!(sink.warning_count(), 1);
    }

    #[test]
    fn into_result_reports_all_errors_not_just_first() {
        let mut sink = DiagnosticSink::new(false);
        sink.error("wf.md", "unknown top-level key 'foo'");
        sink.error("wf.md", "unknown enum value 'bar'");
        let err = sink.into_result().unwrap_err();
        match err {
            CompileError::Diagnostics(diags) => assert_eq!(diags.len(), 2),
            _ => panic!("expected Diagnostics variant"),
        }
    }
}
