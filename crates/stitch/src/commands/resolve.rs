//! `stitch resolve` command implementation.

use std::sync::Arc;

use clap::Args;
use stitch_config::CliSettings;
use stitch_diagnostics::DiagnosticsCollector;
use stitch_links::{CrossLinkResolver, LinkIndex, UrlBuilder};
use stitch_site::AssemblerBuild;
use stitch_toc::Moniker;

use super::ConfigArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the resolve command.
#[derive(Args)]
pub(crate) struct ResolveArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Link to resolve, e.g. `elasticsearch://reference/setup.md#install`.
    /// A bare path belongs to the narrative repository.
    link: String,
}

impl ResolveArgs {
    /// Resolve against the navigation declaration only; pages and anchors
    /// are not verified.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.config.load(CliSettings::default())?;
        let moniker = Moniker::parse_or_bare(&self.link, &config.site.narrative_repository)?;

        let diagnostics = DiagnosticsCollector::new();
        let build = AssemblerBuild::new(config);
        let result = build.validate(&diagnostics);
        output.diagnostics(&diagnostics);
        let registry = result?;

        let site = &build.config().site;
        let urls = UrlBuilder::new(site.base_url.as_deref(), site.path_prefix.as_deref());
        let resolver = CrossLinkResolver::new(Arc::new(registry), Arc::new(LinkIndex::new()), urls)
            .with_declared_repositories(build.config().repository_names());

        let mut problems = Vec::new();
        let url = resolver.try_resolve(|message| problems.push(message), &moniker);
        for problem in &problems {
            output.warning(problem);
        }
        match url {
            Some(url) => {
                output.result(&url);
                Ok(())
            }
            None => Err(CliError::Failed(format!("unable to resolve '{moniker}'"))),
        }
    }
}
