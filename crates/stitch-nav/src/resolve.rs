//! Concurrent resolution of page facts for a built tree.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::Deserialize;
use stitch_diagnostics::DiagnosticsSink;
use stitch_storage::facts::markdown_path_to_url;
use stitch_storage::{DocumentationSource, PageFacts};

use crate::redirects::Redirect;
use crate::tree::{FileLeaf, NavId, NavKind, NavigationTree};

/// Cooperative cancellation flag shared by every task of a build.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ResolveError {
    #[error("navigation resolution was cancelled")]
    Cancelled,
}

/// A navigation tree with the facts of every readable page.
#[derive(Debug, Clone)]
pub struct ResolvedNavigation {
    tree: NavigationTree,
    facts: Vec<Option<PageFacts>>,
    redirects: Vec<Redirect>,
}

impl ResolvedNavigation {
    pub fn tree(&self) -> &NavigationTree {
        &self.tree
    }

    pub fn set_name(&self) -> &str {
        self.tree.set_name()
    }

    /// Facts of a file leaf; `None` for other items and unreadable pages.
    pub fn facts(&self, id: NavId) -> Option<&PageFacts> {
        self.facts.get(id.index()).and_then(Option::as_ref)
    }

    /// Resolved pages in creation order.
    pub fn pages(&self) -> impl Iterator<Item = (NavId, &FileLeaf, &PageFacts)> {
        self.tree
            .files()
            .filter_map(|(id, leaf)| self.facts(id).map(|facts| (id, leaf, facts)))
    }

    pub fn redirects(&self) -> &[Redirect] {
        &self.redirects
    }

    #[must_use]
    pub fn with_redirects(mut self, redirects: Vec<Redirect>) -> Self {
        self.redirects = redirects;
        self
    }
}

#[derive(Deserialize)]
struct RuleFile {
    rule: RuleMeta,
}

#[derive(Deserialize)]
struct RuleMeta {
    name: String,
}

struct Resolver<'a> {
    tree: &'a NavigationTree,
    source: &'a dyn DocumentationSource,
    token: &'a CancellationToken,
    diagnostics: &'a dyn DiagnosticsSink,
}

impl Resolver<'_> {
    /// Resolve one group: every member is a task; the group completes when
    /// all of them do.
    fn group(&self, id: NavId) -> Result<Vec<(NavId, PageFacts)>, ResolveError> {
        let Some(group) = self.tree.group(id) else {
            return Ok(Vec::new());
        };
        let members: Vec<NavId> = group
            .index
            .into_iter()
            .chain(group.children.iter().copied())
            .collect();

        let resolved = members
            .par_iter()
            .map(|member| {
                if self.token.is_cancelled() {
                    return Err(ResolveError::Cancelled);
                }
                match self.tree.node(*member).map(|n| &n.kind) {
                    Some(NavKind::File(leaf)) => Ok(self.page(leaf).map(|f| (*member, f)).into_iter().collect()),
                    Some(NavKind::Group(_)) => self.group(*member),
                    _ => Ok(Vec::new()),
                }
            })
            .collect::<Result<Vec<Vec<_>>, _>>()?;
        Ok(resolved.into_iter().flatten().collect())
    }

    fn page(&self, leaf: &FileLeaf) -> Option<PageFacts> {
        let result = if leaf.path.ends_with(".toml") {
            self.rule(leaf)
        } else {
            self.source.page_facts(&leaf.path).map_err(|e| e.to_string())
        };
        match result {
            Ok(facts) => Some(facts),
            Err(e) => {
                self.diagnostics.error(
                    &format!("{}://{}", self.tree.set_name(), leaf.path),
                    &format!("failed to read page: {e}"),
                );
                None
            }
        }
    }

    /// Facts of a detection rule, published under its markdown path.
    fn rule(&self, leaf: &FileLeaf) -> Result<PageFacts, String> {
        let content = self.source.read(&leaf.path).map_err(|e| e.to_string())?;
        let rule: RuleFile = toml::from_str(&content).map_err(|e| e.to_string())?;
        let page_path = leaf.page_path();
        Ok(PageFacts {
            url: markdown_path_to_url(&page_path),
            relative_path: page_path,
            title: rule.rule.name,
            ..PageFacts::default()
        })
    }
}

impl NavigationTree {
    /// Fetch the facts of every file leaf from `source`.
    ///
    /// Pages are read in parallel. An unreadable page is reported and left
    /// without facts. If `token` is cancelled at any point the whole
    /// resolution fails with [`ResolveError::Cancelled`].
    pub fn resolve(
        self,
        source: &dyn DocumentationSource,
        token: &CancellationToken,
        diagnostics: &dyn DiagnosticsSink,
    ) -> Result<ResolvedNavigation, ResolveError> {
        let resolved = Resolver {
            tree: &self,
            source,
            token,
            diagnostics,
        }
        .group(self.root())?;
        if token.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }

        let mut facts = vec![None; self.len()];
        for (id, page) in resolved {
            facts[id.index()] = Some(page);
        }
        Ok(ResolvedNavigation {
            tree: self,
            facts,
            redirects: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::NavigationBuilder;
    use pretty_assertions::assert_eq;
    use stitch_diagnostics::{DiagnosticsCollector, Severity};
    use stitch_storage::MockSource;

    fn source() -> MockSource {
        MockSource::new("kibana")
            .with_file(
                "docset.yml",
                "toc:\n  - file: index.md\n  - file: guide/setup.md\n    children:\n      - file: guide/install.md\n  - file: broken.md\n  - detection_rules: [rules]\n    file: rules.md\n",
            )
            .with_page("index.md", "Kibana")
            .with_page("guide/setup.md", "Set up")
            .with_file("guide/install.md", "---\nnavigation_title: Install\n---\n# Install Kibana\n## Linux [linux]\n")
            .with_unreadable("broken.md")
            .with_page("rules.md", "Rules")
            .with_file("rules/shell.toml", "[rule]\nname = \"Shell spawned\"\n")
    }

    #[test]
    fn test_resolves_every_readable_page() {
        let source = source();
        let diagnostics = DiagnosticsCollector::new();
        let tree = NavigationBuilder::build(&source, &diagnostics).unwrap();
        let resolved = tree
            .resolve(&source, &CancellationToken::new(), &diagnostics)
            .unwrap();

        let titles: Vec<(&str, &str)> = resolved
            .pages()
            .map(|(_, leaf, facts)| (leaf.path.as_str(), facts.display_title()))
            .collect();
        assert_eq!(
            titles,
            vec![
                ("index.md", "Kibana"),
                ("guide/setup.md", "Set up"),
                ("guide/install.md", "Install"),
                ("rules.md", "Rules"),
                ("rules/shell.toml", "Shell spawned"),
            ]
        );
        let (_, _, install) = resolved.pages().nth(2).unwrap();
        assert_eq!(install.anchors, vec!["install-kibana", "linux"]);
        let (_, _, rule) = resolved.pages().last().unwrap();
        assert_eq!(rule.url, "/rules/shell");

        assert_eq!(diagnostics.errors(), 1);
        assert!(diagnostics.contains(Severity::Error, "failed to read page"));
    }

    #[test]
    fn test_cancelled_resolution_fails() {
        let source = source();
        let diagnostics = DiagnosticsCollector::new();
        let tree = NavigationBuilder::build(&source, &diagnostics).unwrap();
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(
            tree.resolve(&source, &token, &diagnostics).unwrap_err(),
            ResolveError::Cancelled
        );
    }

    #[test]
    fn test_token_is_shared_between_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
