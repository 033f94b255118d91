//! C2 — Import resolver (spec §4.2).
//!
//! Walks the `imports` list transitively, loads and caches imported
//! fragments, detects cycles, and orders the merge leaves-first / root-last.
//!
//! Cycle detection is the teacher's Kahn's-algorithm DAG check
//! (`csa-todo::dag::DependencyGraph::cycle_nodes_bfs`) adapted to a DFS walk
//! that also needs the *path* of the cycle, not just its member set, so the
//! error can name it (spec §4.2, §8 scenario S3: "identifying the cycle
//! `a → b → a`").

use awc_core::diagnostic::Diagnostic;
use awc_core::source::SourceDocument;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Abstracts file I/O so the resolver can be tested without a filesystem.
pub trait SourceLoader {
    fn load(&self, path: &Path) -> Result<(serde_yaml::Value, String), Diagnostic>;
}

/// Reads and parses real files via `awc_frontmatter::parse`.
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn load(&self, path: &Path) -> Result<(serde_yaml::Value, String), Diagnostic> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Diagnostic::error(path, format!("cannot read import: {e}")))?;
        let doc = awc_frontmatter::parse(path, &content)?;
        Ok((doc.frontmatter, doc.body))
    }
}

/// A path prefix reserved for external/agent-manifest files (spec §4.2):
/// treated as opaque, no import semantics of its own.
const OPAQUE_PREFIX: &str = ".github/agents/";

fn extract_imports(frontmatter: &serde_yaml::Value) -> Vec<String> {
    frontmatter
        .get("imports")
        .and_then(|v| v.as_sequence())
        .map(|seq| {
            seq.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn is_lock_file(path: &Path) -> bool {
    path.to_string_lossy().ends_with(".lock.yml")
}

fn is_yaml_workflow(path: &Path) -> bool {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    (ext == "yml" || ext == "yaml") && !is_lock_file(path)
}

struct Cache {
    loader: Box<dyn SourceLoader>,
    loaded: HashMap<PathBuf, (serde_yaml::Value, String)>,
}

/// Resolve `root_path`'s imports into a flattened, deduplicated, leaves-first
/// chain, returning a `SourceDocument` for the root whose `import_chain` is
/// already that final order (each entry's own `import_chain` is empty — the
/// flattening has already happened, so `SourceDocument::merge_order` is a
/// trivial single-level walk downstream).
pub fn resolve(root_path: impl AsRef<Path>, loader: Box<dyn SourceLoader>) -> Result<SourceDocument, Diagnostic> {
    let root_path = root_path.as_ref();
    let mut cache = Cache {
        loader,
        loaded: HashMap::new(),
    };
    let mut flattened: Vec<SourceDocument> = Vec::new();
    let mut finished: HashMap<PathBuf, ()> = HashMap::new();
    let mut branch: Vec<PathBuf> = Vec::new();

    let root_canonical = canonicalize(root_path);
    visit(
        &root_canonical,
        root_path,
        &root_canonical,
        &mut cache,
        &mut branch,
        &mut finished,
        &mut flattened,
    )?;

    let (root_fm, root_body) = load(&mut cache, root_path)?;
    Ok(SourceDocument {
        path: root_path.to_path_buf(),
        frontmatter: root_fm,
        body: root_body,
        import_chain: flattened,
    })
}

fn canonicalize(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn load(cache: &mut Cache, path: &Path) -> Result<(serde_yaml::Value, String), Diagnostic> {
    let canonical = canonicalize(path);
    if let Some(cached) = cache.loaded.get(&canonical) {
        return Ok(cached.clone());
    }
    let loaded = cache.loader.load(path)?;
    cache.loaded.insert(canonical, loaded.clone());
    Ok(loaded)
}

/// DFS post-order traversal: a leaf's contents are appended to `flattened`
/// before the fragment that imports it (spec §4.2). The root itself is
/// never pushed onto `flattened` — `resolve()` builds the returned
/// `SourceDocument` for the root separately, so pushing it here would merge
/// its frontmatter and body a second time.
fn visit(
    canonical: &Path,
    display_path: &Path,
    root_canonical: &Path,
    cache: &mut Cache,
    branch: &mut Vec<PathBuf>,
    finished: &mut HashMap<PathBuf, ()>,
    flattened: &mut Vec<SourceDocument>,
) -> Result<(), Diagnostic> {
    if branch.contains(&canonical.to_path_buf()) {
        let mut cycle: Vec<String> = branch
            .iter()
            .skip_while(|p| *p != canonical)
            .map(|p| p.display().to_string())
            .collect();
        cycle.push(canonical.display().to_string());
        return Err(Diagnostic::error(
            display_path,
            format!("import cycle detected: {}", cycle.join(" → ")),
        ));
    }

    if finished.contains_key(canonical) {
        // De-duplicated: already merged on another branch (spec §4.2).
        return Ok(());
    }

    if is_lock_file(display_path) {
        return Err(Diagnostic::error(
            display_path,
            "refusing to import a '.lock.yml' file",
        ));
    }

    branch.push(canonical.to_path_buf());

    let (frontmatter, body) = load(cache, display_path)?;

    if is_yaml_workflow(display_path) {
        // Constrained: contributes only `jobs`/`services`, never agentic
        // fields (spec §4.2). Enforced here by stripping anything else.
        // A YAML-workflow import does not itself recurse: it contributes
        // only `jobs`/`services`, so it cannot carry further `imports`.
        let allowed = restrict_to_jobs_and_services(&frontmatter);
        finished.insert(canonical.to_path_buf(), ());
        branch.pop();
        if canonical != root_canonical {
            flattened.push(SourceDocument {
                path: display_path.to_path_buf(),
                frontmatter: allowed,
                body,
                import_chain: Vec::new(),
            });
        }
        return Ok(());
    }

    let is_opaque = display_path
        .to_string_lossy()
        .replace('\\', "/")
        .contains(OPAQUE_PREFIX);

    let base_dir = display_path.parent().unwrap_or_else(|| Path::new("."));
    let imports = if is_opaque {
        // Opaque manifest files carry no import semantics of their own.
        Vec::new()
    } else {
        extract_imports(&frontmatter)
    };
    for import in imports {
        let import_path = base_dir.join(&import);
        let import_canonical = canonicalize(&import_path);
        visit(
            &import_canonical,
            &import_path,
            root_canonical,
            cache,
            branch,
            finished,
            flattened,
        )?;
    }

    finished.insert(canonical.to_path_buf(), ());
    branch.pop();
    if canonical != root_canonical {
        flattened.push(SourceDocument {
            path: display_path.to_path_buf(),
            frontmatter,
            body,
            import_chain: Vec::new(),
        });
    }
    Ok(())
}

fn restrict_to_jobs_and_services(frontmatter: &serde_yaml::Value) -> serde_yaml::Value {
    let mut map = serde_yaml::Mapping::new();
    if let Some(v) = frontmatter.get("jobs") {
        map.insert("jobs".into(), v.clone());
    }
    if let Some(v) = frontmatter.get("services") {
        map.insert("services".into(), v.clone());
    }
    serde_yaml::Value::Mapping(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap as StdMap;

    struct MapLoader(RefCell<StdMap<PathBuf, (serde_yaml::Value, String)>>);

    impl SourceLoader for MapLoader {
        fn load(&self, path: &Path) -> Result<(serde_yaml::Value, String), Diagnostic> {
            self.0
                .borrow()
                .get(path)
                .cloned()
                .ok_or_else(|| Diagnostic::error(path, "not found in test fixture"))
        }
    }

    fn doc(yaml: &str, body: &str) -> (serde_yaml::Value, String) {
        (serde_yaml::from_str(yaml).unwrap(), body.to_string())
    }

    fn fixture(entries: Vec<(&str, &str, &str)>) -> MapLoader {
        let mut map = StdMap::new();
        for (path, yaml, body) in entries {
            map.insert(PathBuf::from(path), doc(yaml, body));
        }
        MapLoader(RefCell::new(map))
    }

    #[test]
    fn no_imports_resolves_to_empty_chain() {
        let loader = fixture(vec![("root.md", "engine: copilot", "hi")]);
        let root = resolve("root.md", Box::new(loader)).unwrap();
        assert!(root.import_chain.is_empty());
    }

    #[test]
    fn leaf_merges_before_includer_root_last() {
        let loader = fixture(vec![
            ("root.md", "imports: [a.md]\nengine: copilot", "root body"),
            ("a.md", "permissions:\n  contents: read", "a body"),
        ]);
        let root = resolve("root.md", Box::new(loader)).unwrap();
        let order = root.merge_order();
        assert_eq!(order.len(), 2);
        assert_eq!(order[0].path, PathBuf::from("a.md"));
        assert_eq!(order[1].path, PathBuf::from("root.md"));
    }

    #[test]
    fn cycle_is_rejected_with_named_path() {
        let loader = fixture(vec![
            ("root.md", "imports: [a.md]", "root"),
            ("a.md", "imports: [b.md]", "a"),
            ("b.md", "imports: [a.md]", "b"),
        ]);
        let err = resolve("root.md", Box::new(loader)).unwrap_err();
        assert!(err.message.contains("cycle"));
        assert!(err.message.contains("a.md"));
        assert!(err.message.contains("b.md"));
    }

    #[test]
    fn diamond_import_is_deduplicated_not_double_merged() {
        // root imports a.md and b.md, both of which import shared.md.
        let loader = fixture(vec![
            ("root.md", "imports: [a.md, b.md]", "root"),
            ("a.md", "imports: [shared.md]", "a"),
            ("b.md", "imports: [shared.md]", "b"),
            ("shared.md", "", "shared"),
        ]);
        let root = resolve("root.md", Box::new(loader)).unwrap();
        let order = root.merge_order();
        let shared_count = order
            .iter()
            .filter(|d| d.path == PathBuf::from("shared.md"))
            .count();
        assert_eq!(shared_count, 1);
        assert_eq!(order.len(), 4); // shared, a, b, root
    }

    #[test]
    fn lock_file_import_is_refused() {
        let loader = fixture(vec![("root.md", "imports: [x.lock.yml]", "root")]);
        let err = resolve("root.md", Box::new(loader)).unwrap_err();
        assert!(err.message.contains("lock.yml"));
    }
}
