//! Shared fixtures for the composer, renderer and derived artifact tests.

use std::collections::HashMap;
use std::sync::Arc;

use stitch_diagnostics::DiagnosticsCollector;
use stitch_links::{CrossLinkResolver, OutputPathResolver, UrlBuilder};
use stitch_nav::{CancellationToken, ResolvedNavigation, load_set};
use stitch_storage::MockSource;
use stitch_toc::{DeclarationParser, TocRegistry};

use crate::build::link_index;
use crate::compose::{Composer, SiteRoot};

pub(crate) const NAVIGATION: &str = r"
toc:
  - toc: get-started
    children:
      - toc: elasticsearch://reference
        path_prefix: get-started/elasticsearch
        children:
          - toc: elasticsearch://reference/security
            path_prefix: get-started/elasticsearch/security
  - toc: kibana://
    path_prefix: kibana
phantoms:
  - toc: internal-notes
";

pub(crate) fn narrative() -> MockSource {
    MockSource::new("narrative")
        .with_file("docset.yml", "toc:\n  - toc: get-started\n  - toc: internal-notes\n")
        .with_file("get-started/toc.yml", "toc:\n  - file: index.md\n  - file: quickstart.md\n")
        .with_page("get-started/index.md", "Get started")
        .with_page("get-started/quickstart.md", "Quickstart")
        .with_file("internal-notes/toc.yml", "toc:\n  - file: index.md\n")
        .with_page("internal-notes/index.md", "Internal notes")
}

pub(crate) fn elasticsearch() -> MockSource {
    MockSource::new("elasticsearch")
        .with_file("docset.yml", "toc:\n  - toc: reference\n")
        .with_file(
            "reference/toc.yml",
            "toc:\n  - file: index.md\n  - file: setup.md\n  - toc: security\n",
        )
        .with_page("reference/index.md", "Elasticsearch reference")
        .with_file("reference/setup.md", "# Set up\n\n## Configure [configure]\n")
        .with_file("reference/security/toc.yml", "toc:\n  - file: index.md\n  - file: tls.md\n")
        .with_page("reference/security/index.md", "Security")
        .with_page("reference/security/tls.md", "TLS")
        .with_file("reference/images/diagram.png", "")
}

pub(crate) fn kibana() -> MockSource {
    MockSource::new("kibana")
        .with_file("docset.yml", "toc:\n  - file: index.md\n  - file: discover.md\n  - toc: api\n")
        .with_page("index.md", "Kibana")
        .with_page("discover.md", "Discover")
        .with_file("api/toc.yml", "toc:\n  - file: index.md\n")
        .with_page("api/index.md", "API")
        .with_file(
            "_redirects.yml",
            "redirects:\n  old-discover.md: discover.md\n  es-setup.md: elasticsearch://reference/setup.md\n  index.md: index.md\n",
        )
}

/// A registry, resolved sets and resolvers wired the way a build wires them.
pub(crate) struct Fixture {
    pub registry: Arc<TocRegistry>,
    pub sets: HashMap<String, ResolvedNavigation>,
    pub output: OutputPathResolver,
    pub links: CrossLinkResolver,
    pub diagnostics: DiagnosticsCollector,
}

impl Fixture {
    pub fn new(navigation: &str, sources: Vec<MockSource>) -> Self {
        let diagnostics = DiagnosticsCollector::new();
        let declaration = DeclarationParser::new("navigation.yml", "narrative", &diagnostics)
            .parse(navigation)
            .unwrap();
        let registry = Arc::new(TocRegistry::from_declaration(&declaration, &diagnostics));

        let token = CancellationToken::new();
        let sets: HashMap<String, ResolvedNavigation> = sources
            .iter()
            .filter_map(|source| load_set(source, &token, &diagnostics).unwrap())
            .map(|set| (set.set_name().to_owned(), set))
            .collect();

        let urls = UrlBuilder::new(None, Some("docs"));
        let output = OutputPathResolver::new(Arc::clone(&registry), "/out", urls.clone());
        let links = CrossLinkResolver::new(Arc::clone(&registry), Arc::new(link_index(&sets)), urls);
        Self {
            registry,
            sets,
            output,
            links,
            diagnostics,
        }
    }

    pub fn standard() -> Self {
        Self::new(NAVIGATION, vec![narrative(), elasticsearch(), kibana()])
    }

    pub fn composer(&self) -> Composer<'_> {
        Composer::new(&self.registry, &self.sets, &self.output, &self.links, &self.diagnostics)
    }

    pub fn compose(&self) -> Vec<SiteRoot> {
        self.composer().compose()
    }
}
