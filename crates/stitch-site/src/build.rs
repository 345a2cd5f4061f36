//! Assembler build orchestration.
//!
//! The navigation declaration is parsed, frozen and validated on the calling
//! thread before any repository is touched. Documentation sets are then
//! loaded in parallel on a dedicated rayon pool, and the composed artifacts
//! are written only once every set resolved and the build was not cancelled.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use rayon::prelude::*;
use serde::Serialize;
use stitch_cache::{Cache, MemoryCache};
use stitch_config::Config;
use stitch_diagnostics::{DiagnosticsCollector, DiagnosticsSink};
use stitch_links::{
    CrossLinkResolver, LinkIndex, OutputFile, OutputPathResolver, PrefixChecker, RepositoryLinks, UrlBuilder,
};
use stitch_nav::{CancellationToken, ResolvedNavigation, load_set};
use stitch_storage::{DocumentationSource, FsSource};
use stitch_toc::{DeclarationParser, TocRegistry};

use crate::compose::Composer;
use crate::error::BuildError;
use crate::html::NavigationHtml;
use crate::redirects::RedirectTable;
use crate::sitemap::Sitemap;

/// Outcome of a finished build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub output_dir: PathBuf,
    /// Documentation sets that produced a navigation tree.
    pub sets: usize,
    pub pages: usize,
    /// Published top-level roots (phantoms excluded).
    pub roots: usize,
    pub redirects: usize,
    pub errors: usize,
    pub warnings: usize,
    pub success: bool,
}

/// Page output mapping handed to the page-writing stage, by set and path.
type Manifest = BTreeMap<String, BTreeMap<String, OutputFile>>;

/// Link index of every resolved page, keyed by its path in the set.
pub(crate) fn link_index(sets: &HashMap<String, ResolvedNavigation>) -> LinkIndex {
    let mut index = LinkIndex::new();
    for (name, set) in sets {
        let mut links = RepositoryLinks::new();
        for (_, leaf, facts) in set.pages() {
            links.add_page(&leaf.page_path(), facts.anchors.clone());
        }
        index.insert(name.clone(), links);
    }
    index
}

fn write_file(path: &Path, content: &str) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| BuildError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, content).map_err(|source| BuildError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// One assembler run over every configured repository.
pub struct AssemblerBuild {
    config: Config,
    cache: Arc<dyn Cache>,
    sources: BTreeMap<String, Box<dyn DocumentationSource>>,
}

impl AssemblerBuild {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cache: Arc::new(MemoryCache::new()),
            sources: BTreeMap::new(),
        }
    }

    /// Cache for rendered navigation HTML.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = cache;
        self
    }

    /// Use `source` instead of the repository's checkout directory.
    #[must_use]
    pub fn with_source(mut self, source: Box<dyn DocumentationSource>) -> Self {
        self.sources.insert(source.name().to_owned(), source);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parse the navigation file and build a validated registry.
    ///
    /// Fails on a malformed navigation document or on output path prefixes
    /// claimed twice. No checkout is read.
    pub fn validate(&self, diagnostics: &dyn DiagnosticsSink) -> Result<TocRegistry, BuildError> {
        let path = &self.config.build_resolved.navigation_file;
        let content = fs::read_to_string(path).map_err(|source| BuildError::Read {
            path: path.clone(),
            source,
        })?;
        let label = path.display().to_string();
        let declaration = DeclarationParser::new(&label, &self.config.site.narrative_repository, diagnostics)
            .parse(&content)?;
        let registry = TocRegistry::from_declaration(&declaration, diagnostics);
        registry.validate_path_prefixes()?;
        tracing::info!(entries = registry.len(), path = %path.display(), "Validated navigation");
        Ok(registry)
    }

    /// Run the whole build.
    ///
    /// Problems in individual sets are reported to `diagnostics` and decide
    /// [`BuildReport::success`]; only fatal problems and cancellation return
    /// `Err`. When cancelled nothing is written.
    pub fn run(
        &self,
        token: &CancellationToken,
        diagnostics: &DiagnosticsCollector,
    ) -> Result<BuildReport, BuildError> {
        let registry = Arc::new(self.validate(diagnostics)?);
        if token.is_cancelled() {
            return Err(BuildError::Cancelled);
        }

        let checkouts = self.open_checkouts(&registry, diagnostics);
        let sources: Vec<&dyn DocumentationSource> = self
            .sources
            .iter()
            .filter(|(name, _)| !self.config.is_skipped(name))
            .map(|(_, source)| &**source)
            .chain(checkouts.iter().map(|source| source as &dyn DocumentationSource))
            .collect();

        let sets = self.load_sets(&sources, token, diagnostics)?;
        if token.is_cancelled() {
            return Err(BuildError::Cancelled);
        }

        let site = &self.config.site;
        let urls = UrlBuilder::new(site.base_url.as_deref(), site.path_prefix.as_deref());
        let links = Arc::new(link_index(&sets));
        PrefixChecker::new(&registry).check(&links, diagnostics);

        let output = OutputPathResolver::new(
            Arc::clone(&registry),
            &self.config.build_resolved.output_dir,
            urls.clone(),
        );
        let crosslinks = CrossLinkResolver::new(Arc::clone(&registry), Arc::clone(&links), urls)
            .with_declared_repositories(self.config.repository_names());

        let skipped: Vec<&str> = self
            .config
            .repository_names()
            .filter(|name| self.config.is_skipped(name))
            .collect();
        let roots = Composer::new(&registry, &sets, &output, &crosslinks, diagnostics)
            .with_skipped(skipped)
            .compose();
        let sitemap = Sitemap::from_roots(&roots);
        let redirects = RedirectTable::build(&sets, &registry, &output, &crosslinks, diagnostics);
        let navigation = NavigationHtml::new(self.cache.as_ref()).render_all(&roots);
        let manifest = Self::manifest(&sources, &output, diagnostics);

        if token.is_cancelled() {
            return Err(BuildError::Cancelled);
        }

        let out = output.output_root();
        write_file(&out.join("sitemap.xml"), &sitemap.to_xml(Utc::now())?)?;
        let redirects_json = redirects.to_json().map_err(|source| BuildError::Json {
            artifact: "redirects",
            source,
        })?;
        write_file(&out.join("redirects.json"), &redirects_json)?;
        for (root, html) in roots.iter().zip(&navigation).filter(|(root, _)| !root.is_phantom) {
            write_file(&out.join("navigation").join(format!("{}.html", root.slug())), html)?;
        }
        let manifest_json = serde_json::to_string_pretty(&manifest).map_err(|source| BuildError::Json {
            artifact: "manifest",
            source,
        })?;
        write_file(&out.join("manifest.json"), &manifest_json)?;

        let report = BuildReport {
            output_dir: out.to_path_buf(),
            sets: sets.len(),
            pages: sets.values().map(|set| set.pages().count()).sum(),
            roots: roots.iter().filter(|root| !root.is_phantom).count(),
            redirects: redirects.len(),
            errors: diagnostics.errors(),
            warnings: diagnostics.warnings(),
            success: diagnostics.success(self.config.build_resolved.strict),
        };
        tracing::info!(
            sets = report.sets,
            pages = report.pages,
            errors = report.errors,
            warnings = report.warnings,
            "Assembly finished"
        );
        Ok(report)
    }

    /// Repositories taking part in the build, minus skipped ones.
    fn repositories(&self, registry: &TocRegistry) -> BTreeSet<String> {
        registry
            .repositories()
            .iter()
            .cloned()
            .chain(self.config.repository_names().map(str::to_owned))
            .filter(|name| !self.config.is_skipped(name))
            .collect()
    }

    /// Filesystem sources for repositories without an explicit source.
    fn open_checkouts(&self, registry: &TocRegistry, diagnostics: &dyn DiagnosticsSink) -> Vec<FsSource> {
        self.repositories(registry)
            .into_iter()
            .filter(|name| !self.sources.contains_key(name))
            .filter_map(|name| {
                let checkout = self.config.checkout_dir(&name);
                if checkout.is_dir() {
                    Some(FsSource::for_checkout(name, &checkout))
                } else {
                    diagnostics.warning(
                        &format!("{name}://"),
                        &format!("checkout not found at {}, skipping the repository", checkout.display()),
                    );
                    None
                }
            })
            .collect()
    }

    fn load_sets(
        &self,
        sources: &[&dyn DocumentationSource],
        token: &CancellationToken,
        diagnostics: &DiagnosticsCollector,
    ) -> Result<HashMap<String, ResolvedNavigation>, BuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.build_resolved.threads)
            .build()?;
        let loaded = pool.install(|| {
            sources
                .par_iter()
                .map(|source| {
                    tracing::info!(set = source.name(), "Loading documentation set");
                    load_set(*source, token, diagnostics)
                })
                .collect::<Result<Vec<_>, _>>()
        })?;
        Ok(loaded
            .into_iter()
            .flatten()
            .map(|set| (set.set_name().to_owned(), set))
            .collect())
    }

    /// Output location of every file of every set.
    fn manifest(
        sources: &[&dyn DocumentationSource],
        output: &OutputPathResolver,
        diagnostics: &dyn DiagnosticsSink,
    ) -> Manifest {
        let mut manifest = Manifest::new();
        for source in sources {
            let name = source.name();
            let files = match source.list_files() {
                Ok(files) => files,
                Err(e) => {
                    diagnostics.error(&format!("{name}://"), &format!("failed to list files: {e}"));
                    continue;
                }
            };
            let entries = manifest.entry(name.to_owned()).or_default();
            for file in files {
                if let Some(target) = output.resolve(diagnostics, name, &file) {
                    entries.insert(file, target);
                }
            }
        }
        manifest
    }
}
