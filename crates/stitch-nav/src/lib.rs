//! Navigation of a single documentation set.
//!
//! A set's `docset.yml` (and the nested `toc.yml` files it references) is
//! turned into an arena [`NavigationTree`] by [`NavigationBuilder`], then
//! [`NavigationTree::resolve`] fetches the facts of every page in parallel.
//!
//! ```ignore
//! let diagnostics = DiagnosticsCollector::new();
//! let resolved = load_set(&source, &CancellationToken::new(), &diagnostics)?;
//! ```

mod builder;
mod redirects;
mod resolve;
mod toc_file;
mod tree;

use stitch_diagnostics::DiagnosticsSink;
use stitch_storage::DocumentationSource;

pub use builder::NavigationBuilder;
pub use redirects::{REDIRECT_FILES, Redirect, RedirectsError, load_redirects, parse_redirects};
pub use resolve::{CancellationToken, ResolveError, ResolvedNavigation};
pub use toc_file::{DOCSET_FILES, TOC_FILES, TocFile, TocFileError, TocItem, parse_toc_file};
pub use tree::{CrossLinkLeaf, ExternalLeaf, FileLeaf, Group, NavId, NavKind, NavNode, NavigationTree};

/// Build and resolve a set's navigation and read its redirects.
///
/// `Ok(None)` means the set produced no tree; the reason was reported.
pub fn load_set(
    source: &dyn DocumentationSource,
    token: &CancellationToken,
    diagnostics: &dyn DiagnosticsSink,
) -> Result<Option<ResolvedNavigation>, ResolveError> {
    let Some(tree) = NavigationBuilder::build(source, diagnostics) else {
        return Ok(None);
    };
    let redirects = load_redirects(source).unwrap_or_else(|e| {
        diagnostics.error(&format!("{}://", source.name()), &e.to_string());
        Vec::new()
    });
    let resolved = tree.resolve(source, token, diagnostics)?;
    Ok(Some(resolved.with_redirects(redirects)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stitch_diagnostics::{DiagnosticsCollector, Severity};
    use stitch_storage::MockSource;

    #[test]
    fn test_load_set_reads_redirects() {
        let source = MockSource::new("kibana")
            .with_file("docset.yml", "toc:\n  - file: index.md\n")
            .with_page("index.md", "Kibana")
            .with_file("_redirects.yml", "redirects:\n  old.md: index.md\n");
        let diagnostics = DiagnosticsCollector::new();
        let resolved = load_set(&source, &CancellationToken::new(), &diagnostics)
            .unwrap()
            .unwrap();
        assert_eq!(resolved.redirects().len(), 1);
        assert_eq!(resolved.pages().count(), 1);
    }

    #[test]
    fn test_unreadable_redirects_are_reported() {
        let source = MockSource::new("kibana")
            .with_file("docset.yml", "toc:\n  - file: index.md\n")
            .with_page("index.md", "Kibana")
            .with_unreadable("_redirects.yml");
        let diagnostics = DiagnosticsCollector::new();
        let resolved = load_set(&source, &CancellationToken::new(), &diagnostics)
            .unwrap()
            .unwrap();
        assert!(resolved.redirects().is_empty());
        assert_eq!(diagnostics.errors(), 1);
        assert!(diagnostics.contains(Severity::Error, "failed to read redirects file _redirects.yml"));
        assert!(!diagnostics.success(false));
    }

    #[test]
    fn test_load_set_without_docset() {
        let diagnostics = DiagnosticsCollector::new();
        let source = MockSource::new("kibana");
        assert!(load_set(&source, &CancellationToken::new(), &diagnostics).unwrap().is_none());
        assert_eq!(diagnostics.errors(), 1);
    }
}
