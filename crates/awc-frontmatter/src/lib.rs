//! C1 — Frontmatter loader (spec §4.1).
//!
//! Splits one source file into an opening YAML document delimited by `---`
//! lines and the remainder as Markdown body. Never resolves imports or
//! interprets field semantics: it only produces a `(map, body, path)` tuple.
//! Grounded on the teacher pack's subagent-markdown loader
//! (`vinhnx-VTCode/vtcode-config/src/subagent.rs`), generalized from a
//! fixed struct to an open `serde_yaml::Value`.

use awc_core::diagnostic::Diagnostic;
use awc_core::source::SourceDocument;
use std::path::Path;

const DELIMITER: &str = "---";

/// Parse one file's raw text into a `SourceDocument` with an empty import
/// chain (C2 populates that field later).
pub fn parse(path: impl AsRef<Path>, content: &str) -> Result<SourceDocument, Diagnostic> {
    let path = path.as_ref();
    let (frontmatter_text, body) = split(path, content)?;

    let frontmatter = if frontmatter_text.trim().is_empty() {
        serde_yaml::Value::Mapping(serde_yaml::Mapping::new())
    } else {
        serde_yaml::from_str(&frontmatter_text).map_err(|e| {
            Diagnostic::error(path, format!("invalid YAML in frontmatter: {e}"))
        })?
    };

    if !frontmatter.is_mapping() && !frontmatter.is_null() {
        return Err(Diagnostic::error(
            path,
            "frontmatter must be a YAML mapping at the top level",
        ));
    }

    Ok(SourceDocument::leaf(path, frontmatter, body))
}

/// Split `content` into the frontmatter text and the markdown body.
///
/// Fails if the opening delimiter is missing, or the closing delimiter
/// cannot be found on its own line (spec §4.1: "delimiter closes inside a
/// string or is missing").
fn split(path: &Path, content: &str) -> Result<(String, String), Diagnostic> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut lines = content.lines();
    match lines.next() {
        Some(first) if first.trim_end() == DELIMITER => {}
        _ => {
            return Err(Diagnostic::error(
                path,
                "missing opening frontmatter delimiter '---'",
            ));
        }
    }

    let rest = &content[content.find('\n').map(|i| i + 1).unwrap_or(content.len())..];

    let mut offset = 0usize;
    let mut close_at = None;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\n', '\r']);
        if trimmed == DELIMITER {
            close_at = Some(offset);
            break;
        }
        offset += line.len();
    }

    let close_at = close_at.ok_or_else(|| {
        Diagnostic::error(
            path,
            "missing closing frontmatter delimiter '---' (or it is not on its own line)",
        )
    })?;

    let frontmatter_text = rest[..close_at].to_string();
    let after_delim = &rest[close_at..];
    let body_start = after_delim
        .find('\n')
        .map(|i| close_at + i + 1)
        .unwrap_or(rest.len());
    let body = rest[body_start..].to_string();

    Ok((frontmatter_text, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_frontmatter_and_body() {
        let content = "---\non: workflow_dispatch\nengine: copilot\n---\nSay hi\n";
        let doc = parse("wf.md", content).unwrap();
        assert_eq!(doc.body.trim(), "Say hi");
        assert_eq!(
            doc.frontmatter
                .get("engine")
                .and_then(|v| v.as_str())
                .unwrap(),
            "copilot"
        );
    }

    #[test]
    fn missing_opening_delimiter_is_a_parse_error() {
        let content = "on: push\n---\nbody\n";
        let err = parse("wf.md", content).unwrap_err();
        assert!(err.message.contains("opening"));
    }

    #[test]
    fn missing_closing_delimiter_is_a_parse_error() {
        let content = "---\non: push\nno closing delimiter\n";
        let err = parse("wf.md", content).unwrap_err();
        assert!(err.message.contains("closing"));
    }

    #[test]
    fn empty_frontmatter_yields_empty_mapping() {
        let content = "---\n---\nBody only.\n";
        let doc = parse("wf.md", content).unwrap();
        assert!(doc.frontmatter.is_mapping());
        assert_eq!(doc.body.trim(), "Body only.");
    }

    #[test]
    fn body_preserves_trailing_content_verbatim() {
        let content = "---\nengine: claude\n---\nLine one\n\nLine two\n";
        let doc = parse("wf.md", content).unwrap();
        assert_eq!(doc.body, "Line one\n\nLine two\n");
    }
}
