//! Frozen map from TOC source monikers to their mount points.
//!
//! The registry is built once from a [`DeclarationTree`] by a single thread,
//! then frozen and shared (`Arc<TocRegistry>`) with every consumer. It answers
//! three questions used everywhere else in the assembler:
//!
//! - which entry owns a moniker (longest-prefix match),
//! - which top-level root that entry is mounted under,
//! - whether every mounted entry has a unique output path prefix.

use std::collections::{BTreeSet, HashMap, HashSet};

use stitch_diagnostics::DiagnosticsSink;

use crate::declaration::{DeclarationNode, DeclarationTree};
use crate::moniker::Moniker;

/// One mounted (or phantom) TOC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    /// TOC source in trailing-slash form, e.g. `elasticsearch://reference/`.
    pub source: Moniker,
    /// Path of the TOC inside its repository, e.g. `reference`.
    pub source_path_prefix: String,
    /// Root ancestor of the mounted subtree.
    pub top_level_source: Moniker,
    /// Immediate declaring parent; top-level entries are their own parent.
    pub parent_source: Moniker,
    /// Mount point in the assembled site, e.g. `en/elasticsearch`.
    pub output_path_prefix: String,
    pub is_phantom: bool,
    /// Declaration breadcrumb.
    pub location: String,
}

impl TocEntry {
    /// Registry key.
    pub fn key(&self) -> String {
        self.source.canonical()
    }

    /// Whether this entry is mounted at the root of the site.
    pub fn is_top_level(&self) -> bool {
        self.source == self.top_level_source
    }
}

/// Two mounted entries claim the same output path prefix.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "path prefix '{prefix}' of {declared_by} ({location}) is already used by {first_declared_by} ({first_location})"
)]
pub struct DuplicatePathPrefixError {
    pub prefix: String,
    pub declared_by: String,
    pub location: String,
    pub first_declared_by: String,
    pub first_location: String,
}

/// Every duplicate found by [`TocRegistry::validate_path_prefixes`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} duplicate path prefix(es) in navigation: {}", .duplicates.len(), render_duplicates(.duplicates))]
pub struct PrefixValidationError {
    pub duplicates: Vec<DuplicatePathPrefixError>,
}

fn render_duplicates(duplicates: &[DuplicatePathPrefixError]) -> String {
    duplicates
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Mutable accumulator; call [`freeze`](Self::freeze) when done.
#[derive(Debug, Default)]
pub struct TocRegistryBuilder {
    entries: HashMap<String, TocEntry>,
    order: Vec<String>,
    children: HashMap<String, Vec<String>>,
    top_levels: Vec<String>,
}

impl TocRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten a declaration tree into the builder.
    pub fn add_tree(&mut self, tree: &DeclarationTree, diagnostics: &dyn DiagnosticsSink) {
        for node in tree.toc.iter().chain(&tree.phantoms) {
            self.add_node(node, None, None, diagnostics);
        }
    }

    fn add_node(
        &mut self,
        node: &DeclarationNode,
        top_level: Option<&Moniker>,
        parent: Option<&Moniker>,
        diagnostics: &dyn DiagnosticsSink,
    ) {
        let key = node.source.canonical();
        if let Some(existing) = self.entries.get(&key) {
            diagnostics.error(
                &node.location,
                &format!(
                    "toc {} is already declared at {}, ignoring this declaration",
                    node.source, existing.location
                ),
            );
            return;
        }

        let entry = TocEntry {
            source: node.source.clone(),
            source_path_prefix: node.source.canonical_path().to_owned(),
            top_level_source: top_level.unwrap_or(&node.source).clone(),
            parent_source: parent.unwrap_or(&node.source).clone(),
            output_path_prefix: node.path_prefix.clone(),
            is_phantom: node.is_phantom,
            location: node.location.clone(),
        };

        match parent {
            Some(parent) => self
                .children
                .entry(parent.canonical())
                .or_default()
                .push(key.clone()),
            None => self.top_levels.push(key.clone()),
        }
        self.order.push(key.clone());
        self.entries.insert(key, entry);

        let top_level = top_level.unwrap_or(&node.source);
        for child in &node.children {
            self.add_node(child, Some(top_level), Some(&node.source), diagnostics);
        }
    }

    pub fn freeze(self) -> TocRegistry {
        let repositories = self
            .entries
            .values()
            .map(|e| e.source.scheme().to_owned())
            .collect();
        TocRegistry {
            entries: self.entries,
            order: self.order,
            children: self.children,
            top_levels: self.top_levels,
            repositories,
        }
    }
}

/// Immutable TOC registry.
#[derive(Debug, Default)]
pub struct TocRegistry {
    entries: HashMap<String, TocEntry>,
    order: Vec<String>,
    children: HashMap<String, Vec<String>>,
    top_levels: Vec<String>,
    repositories: BTreeSet<String>,
}

impl TocRegistry {
    /// Build and freeze a registry from a single declaration tree.
    pub fn from_declaration(tree: &DeclarationTree, diagnostics: &dyn DiagnosticsSink) -> Self {
        let mut builder = TocRegistryBuilder::new();
        builder.add_tree(tree, diagnostics);
        builder.freeze()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact lookup by canonical key.
    pub fn get(&self, source: &Moniker) -> Option<&TocEntry> {
        self.entries.get(&source.canonical())
    }

    /// Entry whose source is the longest segment-aligned prefix of `uri`.
    ///
    /// `a/b` owns `a/b` and `a/b/c`, never `a/bc`.
    pub fn longest_prefix(&self, uri: &Moniker) -> Option<&TocEntry> {
        let scheme = uri.scheme();
        let mut path = uri.canonical_path();
        loop {
            if let Some(entry) = self.entries.get(&format!("{scheme}://{path}")) {
                return Some(entry);
            }
            if path.is_empty() {
                return None;
            }
            path = path.rsplit_once('/').map_or("", |(parent, _)| parent);
        }
    }

    /// Top-level entry that `uri` is mounted under.
    pub fn top_level_of(&self, uri: &Moniker) -> Option<&TocEntry> {
        self.longest_prefix(uri)
            .and_then(|entry| self.get(&entry.top_level_source))
    }

    /// All entries sorted by key.
    pub fn entries(&self) -> Vec<&TocEntry> {
        let mut entries: Vec<&TocEntry> = self.entries.values().collect();
        entries.sort_by_key(|e| e.key());
        entries
    }

    /// All entries in declaration order.
    pub fn declared(&self) -> impl Iterator<Item = &TocEntry> {
        self.order.iter().filter_map(|key| self.entries.get(key))
    }

    /// Top-level entries in declaration order, phantoms included.
    pub fn top_levels(&self) -> impl Iterator<Item = &TocEntry> {
        self.top_levels.iter().filter_map(|key| self.entries.get(key))
    }

    /// Entries declared directly below `entry`, in declaration order.
    pub fn children_of(&self, entry: &TocEntry) -> Vec<&TocEntry> {
        self.children
            .get(&entry.key())
            .into_iter()
            .flatten()
            .filter_map(|key| self.entries.get(key))
            .collect()
    }

    /// Repository names referenced by any entry.
    pub fn repositories(&self) -> &BTreeSet<String> {
        &self.repositories
    }

    pub fn phantoms(&self) -> impl Iterator<Item = &TocEntry> {
        self.declared().filter(|e| e.is_phantom)
    }

    /// Whether `uri` falls under a phantom entry.
    pub fn is_phantom(&self, uri: &Moniker) -> bool {
        self.longest_prefix(uri).is_some_and(|e| e.is_phantom)
    }

    /// Check that no two mounted entries share an output path prefix.
    ///
    /// Prefixes compare as `trimmed/`; phantoms are exempt. Every duplicate is
    /// collected, each naming the entry that claimed the prefix first.
    pub fn validate_path_prefixes(&self) -> Result<(), PrefixValidationError> {
        let mut claimed: HashMap<String, &TocEntry> = HashMap::new();
        let mut duplicates = Vec::new();
        let mut seen_pairs = HashSet::new();

        for entry in self.declared().filter(|e| !e.is_phantom) {
            let prefix = format!("{}/", entry.output_path_prefix.trim_matches('/'));
            match claimed.get(&prefix) {
                Some(first) => {
                    if seen_pairs.insert((first.key(), entry.key())) {
                        duplicates.push(DuplicatePathPrefixError {
                            prefix,
                            declared_by: entry.source.to_string(),
                            location: entry.location.clone(),
                            first_declared_by: first.source.to_string(),
                            first_location: first.location.clone(),
                        });
                    }
                }
                None => {
                    claimed.insert(prefix, entry);
                }
            }
        }

        if duplicates.is_empty() {
            Ok(())
        } else {
            Err(PrefixValidationError { duplicates })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::DeclarationParser;
    use pretty_assertions::assert_eq;
    use stitch_diagnostics::DiagnosticsCollector;

    fn registry(yaml: &str) -> (TocRegistry, DiagnosticsCollector) {
        let diagnostics = DiagnosticsCollector::new();
        let tree = DeclarationParser::new("navigation.yml", "narrative", &diagnostics)
            .parse(yaml)
            .unwrap();
        (TocRegistry::from_declaration(&tree, &diagnostics), diagnostics)
    }

    fn moniker(s: &str) -> Moniker {
        Moniker::parse(s).unwrap()
    }

    #[test]
    fn test_nested_narrative_entries() {
        let (registry, _) = registry(
            r"
toc:
  - toc: get-started
    children:
      - toc: install
",
        );
        let parent = registry.get(&moniker("narrative://get-started/")).unwrap();
        let child = registry.get(&moniker("narrative://get-started/install/")).unwrap();
        assert_eq!(parent.output_path_prefix, "get-started");
        assert_eq!(child.output_path_prefix, "get-started/install");
        assert_eq!(child.parent_source, parent.source);
        assert_eq!(child.top_level_source, parent.source);
        assert!(parent.is_top_level());
        assert!(!child.is_top_level());
        assert_eq!(registry.children_of(parent), vec![child]);
    }

    #[test]
    fn test_top_level_inherited_through_depth() {
        let (registry, _) = registry(
            r"
toc:
  - toc: deploy
    children:
      - toc: elasticsearch://deploy
        path_prefix: deploy/self-managed
        children:
          - toc: cloud://guide
            path_prefix: deploy/cloud
",
        );
        let leaf = registry.get(&moniker("cloud://guide")).unwrap();
        assert_eq!(leaf.top_level_source.to_string(), "narrative://deploy/");
        assert_eq!(leaf.parent_source.to_string(), "elasticsearch://deploy/");
        let top = registry.top_level_of(&moniker("cloud://guide/sub/page.md")).unwrap();
        assert_eq!(top.source.to_string(), "narrative://deploy/");
    }

    #[test]
    fn test_longest_prefix_picks_deepest_entry() {
        let (registry, _) = registry(
            r"
toc:
  - toc: x://a/b
    path_prefix: ab
  - toc: x://a/b/c
    path_prefix: abc
",
        );
        let entry = registry.longest_prefix(&moniker("x://a/b/c/d/e")).unwrap();
        assert_eq!(entry.output_path_prefix, "abc");
        let entry = registry.longest_prefix(&moniker("x://a/b/z.md")).unwrap();
        assert_eq!(entry.output_path_prefix, "ab");
    }

    #[test]
    fn test_longest_prefix_respects_segment_boundaries() {
        let (registry, _) = registry(
            r"
toc:
  - toc: x://a/b
    path_prefix: ab
",
        );
        assert_eq!(registry.longest_prefix(&moniker("x://a/bc/d")), None);
        assert_eq!(registry.longest_prefix(&moniker("y://a/b")), None);
    }

    #[test]
    fn test_repository_root_entry_matches_everything_in_repo() {
        let (registry, _) = registry(
            r"
toc:
  - toc: kibana://
    path_prefix: kibana
",
        );
        let entry = registry.longest_prefix(&moniker("kibana://any/page.md")).unwrap();
        assert_eq!(entry.source.to_string(), "kibana://");
    }

    #[test]
    fn test_duplicate_path_prefix_names_both_entries() {
        let (registry, _) = registry(
            r"
toc:
  - toc: elasticsearch://reference
    path_prefix: docs
  - toc: kibana://reference
    path_prefix: /docs/
",
        );
        let err = registry.validate_path_prefixes().unwrap_err();
        assert_eq!(
            err.duplicates,
            vec![DuplicatePathPrefixError {
                prefix: "docs/".to_owned(),
                declared_by: "kibana://reference/".to_owned(),
                location: "navigation.yml: toc[1]".to_owned(),
                first_declared_by: "elasticsearch://reference/".to_owned(),
                first_location: "navigation.yml: toc[0]".to_owned(),
            }]
        );
        let message = err.to_string();
        assert!(message.contains("kibana://reference/"));
        assert!(message.contains("elasticsearch://reference/"));
    }

    #[test]
    fn test_all_duplicates_are_reported() {
        let (registry, _) = registry(
            r"
toc:
  - toc: a://x
    path_prefix: p
  - toc: b://x
    path_prefix: p
  - toc: c://x
    path_prefix: p
",
        );
        assert_eq!(registry.validate_path_prefixes().unwrap_err().duplicates.len(), 2);
    }

    #[test]
    fn test_phantoms_are_exempt_from_uniqueness_but_resolvable() {
        let (registry, _) = registry(
            r"
toc:
  - toc: internal-notes
phantoms:
  - toc: internal-notes-archive
    path_prefix: internal-notes
  - toc: kibana://
",
        );
        assert!(registry.validate_path_prefixes().is_ok());
        assert!(registry.is_phantom(&moniker("kibana://whatever.md")));
        assert!(!registry.is_phantom(&moniker("narrative://internal-notes/a.md")));
        assert_eq!(registry.phantoms().count(), 2);
        assert!(registry.repositories().contains("kibana"));
    }

    #[test]
    fn test_duplicate_source_keeps_first_and_reports() {
        let (registry, diagnostics) = registry(
            r"
toc:
  - toc: kibana://guide
    path_prefix: one
  - toc: kibana://guide/
    path_prefix: two
",
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get(&moniker("kibana://guide")).unwrap().output_path_prefix,
            "one"
        );
        assert_eq!(diagnostics.errors(), 1);
    }

    #[test]
    fn test_construction_is_independent_of_sibling_order() {
        let (first, _) = registry(
            r"
toc:
  - toc: a
  - toc: kibana://guide
    path_prefix: kb
  - toc: b
",
        );
        let (second, _) = registry(
            r"
toc:
  - toc: b
  - toc: a
  - toc: kibana://guide
    path_prefix: kb
",
        );
        let strip = |r: &TocRegistry| -> Vec<(String, String, String)> {
            r.entries()
                .into_iter()
                .map(|e| (e.key(), e.output_path_prefix.clone(), e.top_level_source.to_string()))
                .collect()
        };
        assert_eq!(strip(&first), strip(&second));
    }

    #[test]
    fn test_every_declared_key_resolves_to_itself() {
        let (registry, _) = registry(
            r"
toc:
  - toc: get-started
    children:
      - toc: install
      - toc: elasticsearch://reference
        path_prefix: reference
",
        );
        for entry in registry.entries() {
            let found = registry.longest_prefix(&entry.source).unwrap();
            assert_eq!(found.key(), entry.key());
        }
        assert_eq!(registry.top_levels().count(), 1);
    }
}
