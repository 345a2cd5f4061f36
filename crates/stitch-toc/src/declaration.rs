//! Global navigation declaration (`navigation.yml`).
//!
//! The document is read once into a generic [`serde_yaml::Value`] tree and
//! then transformed into a [`DeclarationTree`]. Only a broken document shape
//! (invalid YAML, a non-mapping root, a missing or non-list `toc`) is fatal;
//! a malformed entry is reported as a warning and its subtree is skipped so
//! that one team's typo does not block every other repository.
//!
//! ```yaml
//! toc:
//!   - toc: get-started
//!     children:
//!       - toc: install
//!   - toc: elasticsearch://reference
//!     path_prefix: reference/elasticsearch
//! phantoms:
//!   - toc: internal-notes
//! ```

use serde_yaml::{Mapping, Value};
use stitch_diagnostics::DiagnosticsSink;

use crate::moniker::{Moniker, MonikerError};

/// Fatal problems with the navigation document as a whole.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DeclarationError {
    #[error("navigation file is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("navigation file must be a mapping at the top level")]
    NotAMapping,
    #[error("navigation file has no 'toc' key")]
    MissingToc,
    #[error("'toc' must be a list of entries")]
    TocNotAList,
}

/// How a node's output path prefix was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOrigin {
    /// Written as `path_prefix`.
    Explicit,
    /// Derived from a bare `toc` path or a `repo` entry.
    Implicit,
    /// Derived from the source moniker because nothing else was given.
    Fallback,
}

/// One mounted TOC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationNode {
    /// TOC source in its normalized trailing-slash form.
    pub source: Moniker,
    /// Output path prefix without leading or trailing slashes.
    pub path_prefix: String,
    pub prefix_origin: PrefixOrigin,
    pub children: Vec<DeclarationNode>,
    pub is_phantom: bool,
    /// Breadcrumb used in diagnostics, e.g. `navigation.yml: toc[1].children[0]`.
    pub location: String,
}

/// Parsed navigation declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationTree {
    pub toc: Vec<DeclarationNode>,
    pub phantoms: Vec<DeclarationNode>,
}

impl DeclarationTree {
    /// All nodes, depth first, mounted entries before phantoms.
    pub fn walk(&self) -> Vec<&DeclarationNode> {
        fn visit<'a>(node: &'a DeclarationNode, out: &mut Vec<&'a DeclarationNode>) {
            out.push(node);
            for child in &node.children {
                visit(child, out);
            }
        }
        let mut out = Vec::new();
        for node in self.toc.iter().chain(&self.phantoms) {
            visit(node, &mut out);
        }
        out
    }
}

/// Context inherited from the enclosing entry.
#[derive(Debug, Default, Clone)]
struct Scope {
    /// Joined bare path of the nearest narrative ancestor.
    bare_parent: Option<String>,
}

/// Converts a navigation document into a [`DeclarationTree`].
pub struct DeclarationParser<'a> {
    file_label: &'a str,
    default_scheme: &'a str,
    diagnostics: &'a dyn DiagnosticsSink,
}

impl<'a> DeclarationParser<'a> {
    /// `file_label` prefixes every diagnostic location; `default_scheme` is
    /// the repository that owns bare paths.
    pub fn new(
        file_label: &'a str,
        default_scheme: &'a str,
        diagnostics: &'a dyn DiagnosticsSink,
    ) -> Self {
        Self {
            file_label,
            default_scheme,
            diagnostics,
        }
    }

    pub fn parse(&self, content: &str) -> Result<DeclarationTree, DeclarationError> {
        let document: Value = serde_yaml::from_str(content)?;
        let Value::Mapping(root) = document else {
            return Err(DeclarationError::NotAMapping);
        };

        let toc = match root.get("toc") {
            None => return Err(DeclarationError::MissingToc),
            Some(Value::Sequence(items)) => self.parse_entries(items, "toc", &Scope::default(), false),
            Some(_) => return Err(DeclarationError::TocNotAList),
        };

        let phantoms = match root.get("phantoms") {
            None => Vec::new(),
            Some(Value::Sequence(items)) => {
                self.parse_entries(items, "phantoms", &Scope::default(), true)
            }
            Some(_) => {
                self.warn("phantoms", "'phantoms' is not a list, ignoring it");
                Vec::new()
            }
        };

        for key in root.keys().filter_map(Value::as_str) {
            if key != "toc" && key != "phantoms" {
                tracing::debug!(file = self.file_label, key, "Ignoring unknown navigation key");
            }
        }

        Ok(DeclarationTree { toc, phantoms })
    }

    fn location(&self, breadcrumb: &str) -> String {
        format!("{}: {breadcrumb}", self.file_label)
    }

    fn warn(&self, breadcrumb: &str, message: &str) {
        self.diagnostics.warning(&self.location(breadcrumb), message);
    }

    fn parse_entries(
        &self,
        items: &[Value],
        breadcrumb: &str,
        scope: &Scope,
        phantom: bool,
    ) -> Vec<DeclarationNode> {
        items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| {
                self.parse_entry(item, &format!("{breadcrumb}[{i}]"), scope, phantom)
            })
            .collect()
    }

    fn parse_entry(
        &self,
        item: &Value,
        breadcrumb: &str,
        scope: &Scope,
        phantom: bool,
    ) -> Option<DeclarationNode> {
        let Value::Mapping(entry) = item else {
            self.warn(breadcrumb, "toc entry is not a mapping, skipping it");
            return None;
        };
        let fields = self.read_fields(entry, breadcrumb)?;

        let mut child_scope = scope.clone();
        let mut implicit_prefix = None;

        let source = match (fields.toc, fields.repo) {
            (toc, Some(repo)) => {
                if let Some(toc) = toc {
                    self.diagnostics.error(
                        &self.location(breadcrumb),
                        &format!("toc entry defines 'repo' which can not be combined with 'toc': {toc}"),
                    );
                }
                let parent = scope.bare_parent.as_deref().unwrap_or_default();
                implicit_prefix = Some(join_path(parent, &repo));
                Moniker::parse(&format!("{repo}://{parent}"))
            }
            (Some(toc), None) if Moniker::is_bare(&toc) => {
                let joined = nest_bare_path(scope.bare_parent.as_deref(), &toc);
                implicit_prefix = Some(joined.clone());
                child_scope.bare_parent = Some(joined.clone());
                Moniker::parse_or_bare(&joined, self.default_scheme)
            }
            (Some(toc), None) => Moniker::parse(&toc),
            (None, None) => {
                self.warn(breadcrumb, "toc entry defines neither 'toc' nor 'repo', skipping it");
                return None;
            }
        };
        let source = match source {
            Ok(moniker) => moniker.to_toc_source(),
            Err(err) => {
                self.warn(breadcrumb, &invalid_source_message(&err));
                return None;
            }
        };

        let (path_prefix, prefix_origin) = match (fields.path_prefix, implicit_prefix) {
            (Some(explicit), _) => (explicit.trim_matches('/').to_owned(), PrefixOrigin::Explicit),
            (None, Some(implicit)) => (implicit, PrefixOrigin::Implicit),
            (None, None) => {
                let fallback = fallback_prefix(&source);
                if !phantom {
                    self.warn(
                        breadcrumb,
                        &format!(
                            "path prefix is not defined for: {source}, falling back to '{fallback}' which may be incorrect"
                        ),
                    );
                }
                (fallback, PrefixOrigin::Fallback)
            }
        };

        let children = match fields.children {
            None => Vec::new(),
            Some(Value::Sequence(items)) => {
                self.parse_entries(items, &format!("{breadcrumb}.children"), &child_scope, phantom)
            }
            Some(_) => {
                self.warn(breadcrumb, "'children' is not a list, skipping children");
                Vec::new()
            }
        };

        Some(DeclarationNode {
            source,
            path_prefix,
            prefix_origin,
            children,
            is_phantom: phantom,
            location: self.location(breadcrumb),
        })
    }

    fn read_fields<'v>(&self, entry: &'v Mapping, breadcrumb: &str) -> Option<EntryFields<'v>> {
        let mut fields = EntryFields::default();
        for (key, value) in entry {
            let Some(key) = key.as_str() else {
                self.warn(breadcrumb, &format!("key '{}' is not a string", describe(key)));
                return None;
            };
            match key {
                "toc" => fields.toc = Some(self.scalar(value, breadcrumb, key)?),
                "repo" => fields.repo = Some(self.scalar(value, breadcrumb, key)?),
                "path_prefix" => fields.path_prefix = Some(self.scalar(value, breadcrumb, key)?),
                "children" => fields.children = Some(value),
                other => {
                    tracing::debug!(location = breadcrumb, key = other, "Ignoring unknown toc entry key");
                }
            }
        }
        Some(fields)
    }

    fn scalar(&self, value: &Value, breadcrumb: &str, key: &str) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => {
                self.warn(breadcrumb, &format!("'{key}' must be a string, skipping entry"));
                None
            }
        }
    }
}

#[derive(Default)]
struct EntryFields<'v> {
    toc: Option<String>,
    repo: Option<String>,
    path_prefix: Option<String>,
    children: Option<&'v Value>,
}

fn describe(value: &Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim().to_owned())
        .unwrap_or_default()
}

fn invalid_source_message(err: &MonikerError) -> String {
    format!("source toc entry is not a valid moniker: {err}")
}

fn join_path(parent: &str, child: &str) -> String {
    let parent = parent.trim_matches('/');
    let child = child.trim_matches('/');
    if parent.is_empty() {
        child.to_owned()
    } else {
        format!("{parent}/{child}")
    }
}

/// A bare child path is placed below its bare parent unless it already is.
fn nest_bare_path(parent: Option<&str>, child: &str) -> String {
    let child = child.trim_matches('/');
    match parent {
        Some(parent) if child != parent && !child.starts_with(&format!("{parent}/")) => {
            join_path(parent, child)
        }
        _ => child.to_owned(),
    }
}

fn fallback_prefix(source: &Moniker) -> String {
    let path = source.canonical_path();
    if path.is_empty() {
        source.scheme().to_owned()
    } else {
        path.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use stitch_diagnostics::{DiagnosticsCollector, Severity};

    fn parse(yaml: &str) -> (Result<DeclarationTree, DeclarationError>, DiagnosticsCollector) {
        let diagnostics = DiagnosticsCollector::new();
        let result = DeclarationParser::new("navigation.yml", "narrative", &diagnostics).parse(yaml);
        (result, diagnostics)
    }

    fn sources(nodes: &[&DeclarationNode]) -> Vec<(String, String)> {
        nodes
            .iter()
            .map(|n| (n.source.to_string(), n.path_prefix.clone()))
            .collect()
    }

    #[test]
    fn test_nested_bare_paths() {
        let (tree, diagnostics) = parse(
            r"
toc:
  - toc: get-started
    children:
      - toc: install
",
        );
        let tree = tree.unwrap();
        assert_eq!(
            sources(&tree.walk()),
            vec![
                ("narrative://get-started/".to_owned(), "get-started".to_owned()),
                (
                    "narrative://get-started/install/".to_owned(),
                    "get-started/install".to_owned()
                ),
            ]
        );
        assert_eq!(tree.toc[0].prefix_origin, PrefixOrigin::Implicit);
        assert_eq!(diagnostics.diagnostics(), Vec::new());
    }

    #[test]
    fn test_bare_child_already_below_parent_is_not_doubled() {
        let (tree, _) = parse(
            r"
toc:
  - toc: deploy
    children:
      - toc: deploy/cloud
",
        );
        let tree = tree.unwrap();
        assert_eq!(tree.toc[0].children[0].source.to_string(), "narrative://deploy/cloud/");
    }

    #[test]
    fn test_scheme_source_with_explicit_prefix() {
        let (tree, diagnostics) = parse(
            r"
toc:
  - toc: elasticsearch://reference
    path_prefix: /en/elasticsearch/
",
        );
        let node = &tree.unwrap().toc[0];
        assert_eq!(node.source.to_string(), "elasticsearch://reference/");
        assert_eq!(node.path_prefix, "en/elasticsearch");
        assert_eq!(node.prefix_origin, PrefixOrigin::Explicit);
        assert_eq!(node.location, "navigation.yml: toc[0]");
        assert!(diagnostics.success(true));
    }

    #[test]
    fn test_missing_prefix_falls_back_with_warning() {
        let (tree, diagnostics) = parse(
            r"
toc:
  - toc: kibana://guide
",
        );
        let node = &tree.unwrap().toc[0];
        assert_eq!(node.path_prefix, "guide");
        assert_eq!(node.prefix_origin, PrefixOrigin::Fallback);
        assert_eq!(diagnostics.warnings(), 1);
        assert!(diagnostics.contains(Severity::Warning, "may be incorrect"));
    }

    #[test]
    fn test_repo_entry_uses_parent_path() {
        let (tree, diagnostics) = parse(
            r"
toc:
  - toc: extend
    children:
      - repo: kibana
      - repo: beats
        path_prefix: extend/beats-dev
",
        );
        let tree = tree.unwrap();
        let children = &tree.toc[0].children;
        assert_eq!(children[0].source.to_string(), "kibana://extend/");
        assert_eq!(children[0].path_prefix, "extend/kibana");
        assert_eq!(children[1].source.to_string(), "beats://extend/");
        assert_eq!(children[1].path_prefix, "extend/beats-dev");
        assert_eq!(diagnostics.diagnostics(), Vec::new());
    }

    #[test]
    fn test_repo_and_toc_conflict_is_error_and_repo_wins() {
        let (tree, diagnostics) = parse(
            r"
toc:
  - toc: kibana://guide
    repo: kibana
    path_prefix: kb
",
        );
        let node = &tree.unwrap().toc[0];
        assert_eq!(node.source.to_string(), "kibana://");
        assert_eq!(diagnostics.errors(), 1);
        assert!(diagnostics.contains(Severity::Error, "can not be combined"));
    }

    #[test]
    fn test_phantoms_are_flagged_and_silent() {
        let (tree, diagnostics) = parse(
            r"
toc:
  - toc: get-started
phantoms:
  - toc: internal-notes
  - toc: cloud://
",
        );
        let tree = tree.unwrap();
        assert_eq!(tree.phantoms.len(), 2);
        assert!(tree.phantoms.iter().all(|p| p.is_phantom));
        assert!(!tree.toc[0].is_phantom);
        assert_eq!(tree.phantoms[1].path_prefix, "cloud");
        assert_eq!(diagnostics.warnings(), 0);
    }

    #[test]
    fn test_malformed_entries_are_skipped_with_warnings() {
        let (tree, diagnostics) = parse(
            r"
toc:
  - just-a-string
  - path_prefix: orphan
  - toc: [not, scalar]
  - toc: 'bad scheme://x'
  - toc: good
    children: nope
",
        );
        let tree = tree.unwrap();
        assert_eq!(tree.toc.len(), 1);
        assert_eq!(tree.toc[0].source.to_string(), "narrative://good/");
        assert!(tree.toc[0].children.is_empty());
        assert_eq!(diagnostics.warnings(), 5);
        let locations: Vec<String> = diagnostics
            .diagnostics()
            .into_iter()
            .map(|d| d.location)
            .collect();
        assert_eq!(locations[0], "navigation.yml: toc[0]");
        assert_eq!(locations[4], "navigation.yml: toc[4]");
    }

    #[test]
    fn test_breadcrumbs_for_nested_children() {
        let (tree, diagnostics) = parse(
            r"
toc:
  - toc: a
    children:
      - toc: b
      - 42
",
        );
        let tree = tree.unwrap();
        assert_eq!(tree.toc[0].children[0].location, "navigation.yml: toc[0].children[0]");
        assert_eq!(
            diagnostics.diagnostics()[0].location,
            "navigation.yml: toc[0].children[1]"
        );
    }

    #[test]
    fn test_fatal_document_errors() {
        assert!(matches!(parse("toc: [").0, Err(DeclarationError::Yaml(_))));
        assert!(matches!(parse("- a\n- b\n").0, Err(DeclarationError::NotAMapping)));
        assert!(matches!(parse("phantoms: []\n").0, Err(DeclarationError::MissingToc)));
        assert!(matches!(parse("toc: get-started\n").0, Err(DeclarationError::TocNotAList)));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let (tree, diagnostics) = parse(
            r"
version: 2
toc:
  - toc: a
    description: hello
",
        );
        assert_eq!(tree.unwrap().toc.len(), 1);
        assert!(diagnostics.success(true));
    }
}
