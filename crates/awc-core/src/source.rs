//! `SourceDocument` (spec §3).

use serde_yaml::Value;
use std::path::{Path, PathBuf};

/// One parsed source file: a frontmatter map plus a markdown body, with its
/// resolved import chain attached once C2 has run.
///
/// Invariant: `import_chain` contains no duplicate canonical paths; a cycle
/// is a compile error raised before a `SourceDocument` with a populated
/// chain is ever constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub frontmatter: Value,
    pub body: String,
    pub import_chain: Vec<SourceDocument>,
}

impl SourceDocument {
    pub fn leaf(path: impl AsRef<Path>, frontmatter: Value, body: impl Into<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            frontmatter,
            body: body.into(),
            import_chain: Vec::new(),
        }
    }

    /// Canonical merge order: leaves first, root last (spec §4.2).
    pub fn merge_order(&self) -> Vec<&SourceDocument> {
        let mut order = Vec::new();
        for imported in &self.import_chain {
            order.extend(imported.merge_order());
        }
        order.push(self);
        order
    }
}
