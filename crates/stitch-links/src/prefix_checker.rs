//! Detects URL paths claimed by more than one repository.

use std::collections::HashMap;

use stitch_diagnostics::DiagnosticsSink;
use stitch_toc::{Moniker, TocRegistry};

use crate::link_index::LinkIndex;
use crate::uri::{join_segments, strip_segment_prefix, to_target_url_path};

struct Claim<'a> {
    repository: &'a str,
    page: &'a str,
}

/// Walks every published page of every repository and checks that the URL
/// sub-paths it occupies below its mount point belong to it alone.
pub struct PrefixChecker<'a> {
    registry: &'a TocRegistry,
    phantom_prefixes: Vec<String>,
}

impl<'a> PrefixChecker<'a> {
    pub fn new(registry: &'a TocRegistry) -> Self {
        let phantom_prefixes = registry
            .phantoms()
            .map(|e| e.output_path_prefix.trim_matches('/').to_owned())
            .collect();
        Self {
            registry,
            phantom_prefixes,
        }
    }

    fn under_phantom(&self, path: &str) -> bool {
        self.phantom_prefixes
            .iter()
            .any(|prefix| strip_segment_prefix(path, prefix).is_some())
    }

    /// Report every collision and every page outside all TOCs; returns the
    /// number of problems found.
    pub fn check(&self, links: &LinkIndex, diagnostics: &dyn DiagnosticsSink) -> usize {
        let mut claims: HashMap<String, Claim<'_>> = HashMap::new();
        let mut problems = 0;

        for (repository, repository_links) in links.iter() {
            for page in repository_links.links.keys() {
                let dir = page.rsplit_once('/').map_or("", |(dir, _)| dir);
                let Some(entry) = self.registry.longest_prefix(&Moniker::new(repository, dir)) else {
                    diagnostics.error(
                        &format!("{repository}://{page}"),
                        "page is not declared in any toc nor a phantom",
                    );
                    problems += 1;
                    continue;
                };
                if entry.is_phantom {
                    continue;
                }

                let remainder = strip_segment_prefix(page, &entry.source_path_prefix).unwrap_or(page);
                let base = entry.output_path_prefix.trim_matches('/');
                let target = to_target_url_path(remainder);

                let mut sub_path = base.to_owned();
                let segments = std::iter::once("").chain(target.split('/').filter(|s| !s.is_empty()));
                for segment in segments {
                    sub_path = join_segments(&[&sub_path, segment]);
                    if let Some(claim) = claims.get(&sub_path) {
                        if claim.repository != repository && !self.under_phantom(&sub_path) {
                            diagnostics.error(
                                &format!("{repository}://{page}"),
                                &format!(
                                    "'{sub_path}' is already claimed by {}://{}",
                                    claim.repository, claim.page
                                ),
                            );
                            problems += 1;
                            break;
                        }
                    } else {
                        claims.insert(sub_path.clone(), Claim { repository, page });
                    }
                }
            }
        }

        if problems > 0 {
            tracing::warn!(problems, "Link namespace check found problems");
        }
        problems
    }
}
