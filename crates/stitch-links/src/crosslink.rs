//! Resolution of `repo://path#anchor` links into published URLs.

use std::collections::BTreeSet;
use std::sync::Arc;

use stitch_diagnostics::DiagnosticsSink;
use stitch_toc::{Moniker, TocRegistry};

use crate::link_index::LinkIndex;
use crate::uri::{UrlBuilder, join_segments, strip_segment_prefix, to_target_url_path};

/// Resolves cross-repository links against the TOC registry.
///
/// When the link index knows the target repository, the linked page and
/// anchor are verified as well. Problems are reported through the caller's
/// error callback; only an unknown repository makes resolution fail.
pub struct CrossLinkResolver {
    registry: Arc<TocRegistry>,
    links: Arc<LinkIndex>,
    urls: UrlBuilder,
    declared: BTreeSet<String>,
}

impl CrossLinkResolver {
    pub fn new(registry: Arc<TocRegistry>, links: Arc<LinkIndex>, urls: UrlBuilder) -> Self {
        Self {
            registry,
            links,
            urls,
            declared: BTreeSet::new(),
        }
    }

    /// Repositories declared in configuration that may be linked to even
    /// if they mount nothing.
    #[must_use]
    pub fn with_declared_repositories<I, S>(mut self, repositories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declared.extend(repositories.into_iter().map(Into::into));
        self
    }

    pub fn is_known_repository(&self, scheme: &str) -> bool {
        self.registry.repositories().contains(scheme)
            || self.declared.contains(scheme)
            || self.links.contains(scheme)
    }

    /// Resolve `uri` to a URL.
    ///
    /// Returns `None` only for an unknown repository. An address outside
    /// every mounted TOC yields the `reference/{repo}/...` fallback URL, and
    /// a missing page or anchor still yields the page URL; each of these is
    /// reported through `on_error`.
    pub fn try_resolve(&self, mut on_error: impl FnMut(String), uri: &Moniker) -> Option<String> {
        let scheme = uri.scheme();
        if !self.is_known_repository(scheme) {
            on_error(format!(
                "'{scheme}' is not a known repository, unable to resolve '{uri}'"
            ));
            return None;
        }

        let canonical = uri.canonical_path();
        let Some(entry) = self.registry.longest_prefix(uri) else {
            on_error(format!("no defined toc for url: {uri}"));
            let fallback = join_segments(&["reference", scheme, &to_target_url_path(canonical)]);
            return Some(self.urls.url(&fallback));
        };

        let remainder = strip_segment_prefix(canonical, &entry.source_path_prefix).unwrap_or(canonical);
        let path = join_segments(&[&entry.output_path_prefix, &to_target_url_path(remainder)]);
        let mut url = self.urls.url(&path);

        if self.verify_target(&mut on_error, uri) && let Some(fragment) = uri.fragment() {
            url.push('#');
            url.push_str(fragment);
        }
        Some(url)
    }

    /// Resolve and forward problems to a diagnostics sink at `location`.
    pub fn resolve(
        &self,
        diagnostics: &dyn DiagnosticsSink,
        location: &str,
        uri: &Moniker,
    ) -> Option<String> {
        self.try_resolve(|message| diagnostics.error(location, &message), uri)
    }

    /// Check the target page and anchor; `true` when the fragment may be kept.
    fn verify_target(&self, on_error: &mut impl FnMut(String), uri: &Moniker) -> bool {
        let scheme = uri.scheme();
        let Some(repository) = self.links.get(scheme) else {
            return true;
        };

        let canonical = uri.canonical_path();
        let candidates = [
            uri.page_path().to_owned(),
            format!("{canonical}.md"),
            join_segments(&[canonical, "index.md"]),
        ];
        let Some((path, page)) = candidates
            .iter()
            .find_map(|c| repository.page(c).map(|page| (c, page)))
        else {
            on_error(format!(
                "'{}' is not a valid link in the '{scheme}' link index",
                uri.page_path()
            ));
            return false;
        };

        match uri.fragment() {
            Some(fragment) if !page.anchors.iter().any(|a| a == fragment) => {
                on_error(format!("'{path}' has no anchor named: '#{fragment}'"));
                false
            }
            _ => true,
        }
    }
}
