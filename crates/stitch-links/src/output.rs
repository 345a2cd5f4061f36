//! Placement of documentation set files in the assembled output.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use stitch_diagnostics::DiagnosticsSink;
use stitch_toc::{Moniker, TocEntry, TocRegistry};

use crate::uri::{UrlBuilder, join_segments, strip_segment_prefix, to_target_url_path};

/// Directory names whose contents are copied by other means.
const EXEMPT_DIRS: &[&str] = &["images", "examples", "raw-migrated-files", "doc_examples"];

/// Bucket for files that match no mount point.
const FAILED_DIR: &str = "_failed";

/// Where one file of a documentation set is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputFile {
    pub path: PathBuf,
    /// Published URL; only for markdown pages with a mount point.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// `true` when the file landed in the `_failed` bucket.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}

/// Maps `(set, relative path)` to an output location by longest-prefix
/// match against the TOC registry.
pub struct OutputPathResolver {
    registry: Arc<TocRegistry>,
    output_root: PathBuf,
    urls: UrlBuilder,
}

/// Paths that are never mapped, only skipped.
fn is_exempt(relative_path: &str) -> bool {
    let (dirs, file) = relative_path
        .trim_matches('/')
        .rsplit_once('/')
        .unwrap_or(("", relative_path));
    dirs.split('/').any(|d| EXEMPT_DIRS.contains(&d))
        || file == "docset.yml"
        || file == "_docset.yml"
        || Path::new(file).extension().is_some_and(|e| e == "asciidoc")
}

fn parent_dir(path: &str) -> &str {
    path.trim_matches('/').rsplit_once('/').map_or("", |(dir, _)| dir)
}

impl OutputPathResolver {
    pub fn new(registry: Arc<TocRegistry>, output_root: impl Into<PathBuf>, urls: UrlBuilder) -> Self {
        Self {
            registry,
            output_root: output_root.into(),
            urls,
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Mount point owning `relative_path`, matched on its directory so that
    /// `reference.md` next to a `reference/` TOC stays with its own parent.
    fn mount(&self, set: &str, relative_path: &str) -> Option<(&TocEntry, String)> {
        let owner = Moniker::new(set, parent_dir(relative_path));
        let entry = self.registry.longest_prefix(&owner)?;
        let remainder = strip_segment_prefix(relative_path, &entry.source_path_prefix)?;
        Some((entry, remainder.to_owned()))
    }

    /// Output location for a file.
    ///
    /// `None` means the file is exempt and skipped. A file matching no mount
    /// point is placed under `_failed/{set}/` and reported.
    pub fn resolve(
        &self,
        diagnostics: &dyn DiagnosticsSink,
        set: &str,
        relative_path: &str,
    ) -> Option<OutputFile> {
        let relative_path = relative_path.trim_matches('/');
        if let Some((entry, remainder)) = self.mount(set, relative_path) {
            let path = self
                .output_root
                .join(&entry.output_path_prefix)
                .join(&remainder);
            let url = Path::new(&remainder)
                .extension()
                .is_some_and(|e| e == "md")
                .then(|| self.page_url(&entry.output_path_prefix, &remainder));
            return Some(OutputFile {
                path,
                url,
                fallback: false,
            });
        }

        if is_exempt(relative_path) {
            tracing::debug!(set, path = relative_path, "Skipping exempt file");
            return None;
        }

        let key = format!("{set}://{relative_path}");
        let path = self.output_root.join(FAILED_DIR).join(set).join(relative_path);
        diagnostics.error(
            &key,
            &format!(
                "'{key}' is not part of any mounted toc, writing it to {}",
                path.display()
            ),
        );
        Some(OutputFile {
            path,
            url: None,
            fallback: true,
        })
    }

    /// Published URL of a markdown page, without reporting anything.
    pub fn url_for(&self, set: &str, relative_path: &str) -> Option<String> {
        let (entry, remainder) = self.mount(set, relative_path.trim_matches('/'))?;
        Some(self.page_url(&entry.output_path_prefix, &remainder))
    }

    fn page_url(&self, prefix: &str, remainder: &str) -> String {
        self.urls
            .url(&join_segments(&[prefix, &to_target_url_path(remainder)]))
    }
}
