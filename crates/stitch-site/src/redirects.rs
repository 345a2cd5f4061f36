//! Site-wide redirect table.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use stitch_diagnostics::DiagnosticsSink;
use stitch_links::{CrossLinkResolver, OutputPathResolver};
use stitch_nav::{Redirect, ResolvedNavigation};
use stitch_toc::{Moniker, TocRegistry};

/// Published `from -> to` URLs, sorted by source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RedirectTable {
    entries: BTreeMap<String, String>,
}

fn normalize(url: &str) -> &str {
    match url.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

fn is_external(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://")
}

impl RedirectTable {
    /// Map every set's redirects to published URLs.
    ///
    /// Sources under a phantom are skipped. Entries whose source or target
    /// can not be mapped are reported; entries that point at themselves are
    /// dropped.
    pub fn build(
        sets: &HashMap<String, ResolvedNavigation>,
        registry: &TocRegistry,
        output: &OutputPathResolver,
        links: &CrossLinkResolver,
        diagnostics: &dyn DiagnosticsSink,
    ) -> Self {
        let mut names: Vec<&String> = sets.keys().collect();
        names.sort();

        let mut table = Self::default();
        for name in names {
            for redirect in sets[name].redirects() {
                if registry.is_phantom(&Moniker::new(name, redirect.from.as_str())) {
                    continue;
                }
                let location = format!("{name}://{}", redirect.from);
                if let Some((from, to)) = Self::map(name, redirect, output, links, diagnostics, &location) {
                    table.insert(from, to, diagnostics, &location);
                }
            }
        }
        table
    }

    fn map(
        set: &str,
        redirect: &Redirect,
        output: &OutputPathResolver,
        links: &CrossLinkResolver,
        diagnostics: &dyn DiagnosticsSink,
        location: &str,
    ) -> Option<(String, String)> {
        let Some(from) = output.url_for(set, &redirect.from) else {
            diagnostics.error(
                location,
                &format!("redirect source '{}' is not part of any mounted toc", redirect.from),
            );
            return None;
        };

        let target = redirect.to.trim();
        let to = if is_external(target) {
            Some(target.to_owned())
        } else if Moniker::is_bare(target) {
            let (path, fragment) = target.split_once('#').map_or((target, None), |(p, f)| (p, Some(f)));
            output.url_for(set, path).map(|url| match fragment {
                Some(fragment) if !fragment.is_empty() => format!("{url}#{fragment}"),
                _ => url,
            })
        } else {
            match Moniker::parse(target) {
                Ok(moniker) => links.resolve(diagnostics, location, &moniker),
                Err(e) => {
                    diagnostics.error(location, &format!("redirect target '{target}' is not a valid link: {e}"));
                    return None;
                }
            }
        };
        let Some(to) = to else {
            diagnostics.error(location, &format!("redirect target '{target}' could not be resolved"));
            return None;
        };

        if normalize(&from) == normalize(&to) {
            tracing::debug!(location, from = %from, "Dropping redirect to itself");
            return None;
        }
        Some((from, to))
    }

    fn insert(&mut self, from: String, to: String, diagnostics: &dyn DiagnosticsSink, location: &str) {
        match self.entries.get(&from) {
            Some(existing) if *existing != to => {
                diagnostics.warning(
                    location,
                    &format!("redirect from '{from}' is already defined to '{existing}', ignoring '{to}'"),
                );
            }
            Some(_) => {}
            None => {
                self.entries.insert(from, to);
            }
        }
    }

    pub fn get(&self, from: &str) -> Option<&str> {
        self.entries.get(from).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(from, to)| (from.as_str(), to.as_str()))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Fixture, NAVIGATION, elasticsearch, kibana, narrative};
    use pretty_assertions::assert_eq;
    use stitch_diagnostics::Severity;
    use stitch_storage::MockSource;

    fn table(fixture: &Fixture) -> RedirectTable {
        RedirectTable::build(
            &fixture.sets,
            &fixture.registry,
            &fixture.output,
            &fixture.links,
            &fixture.diagnostics,
        )
    }

    #[test]
    fn test_relative_and_cross_repository_targets() {
        let fixture = Fixture::standard();
        let table = table(&fixture);
        assert_eq!(
            table.iter().collect::<Vec<_>>(),
            vec![
                ("/docs/kibana/es-setup", "/docs/get-started/elasticsearch/setup"),
                ("/docs/kibana/old-discover", "/docs/kibana/discover"),
            ]
        );
        assert_eq!(fixture.diagnostics.errors(), 0);
    }

    #[test]
    fn test_phantom_sources_are_skipped() {
        let narrative = narrative().with_file("_redirects.yml", "redirects:\n  internal-notes/old.md: get-started/index.md\n");
        let fixture = Fixture::new(NAVIGATION, vec![narrative, elasticsearch(), kibana()]);
        let table = table(&fixture);
        assert!(table.iter().all(|(from, _)| !from.contains("internal-notes")));
        assert_eq!(fixture.diagnostics.errors(), 0);
    }

    #[test]
    fn test_unmapped_redirects_are_reported() {
        let source = MockSource::new("kibana")
            .with_file("docset.yml", "toc:\n  - file: index.md\n")
            .with_page("index.md", "Kibana")
            .with_file(
                "_redirects.yml",
                "redirects:\n  a.md: beats://index.md\n  b.md: 'https://example.com/b'\n  c.md: index.md#intro\n",
            );
        let fixture = Fixture::new("toc:\n  - toc: kibana://\n    path_prefix: kibana\n", vec![source]);
        let table = table(&fixture);
        assert_eq!(table.get("/docs/kibana/a"), None);
        assert_eq!(table.get("/docs/kibana/b"), Some("https://example.com/b"));
        assert_eq!(table.get("/docs/kibana/c"), Some("/docs/kibana#intro"));
        assert!(fixture.diagnostics.contains(Severity::Error, "'beats' is not a known repository"));
        assert!(fixture.diagnostics.contains(Severity::Error, "could not be resolved"));
    }

    #[test]
    fn test_serializes_as_json_object() {
        let fixture = Fixture::standard();
        let json = table(&fixture).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["/docs/kibana/old-discover"], "/docs/kibana/discover");
    }
}
