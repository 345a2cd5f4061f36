//! `stitch build` command implementation.

use std::path::PathBuf;

use clap::Args;
use stitch_config::CliSettings;
use stitch_diagnostics::DiagnosticsCollector;
use stitch_site::{AssemblerBuild, CancellationToken};

use super::ConfigArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Output directory for the assembled site (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Directory holding one checkout per repository (overrides config).
    #[arg(long)]
    checkouts_dir: Option<PathBuf>,

    /// Treat warnings as failures.
    #[arg(long)]
    strict: bool,

    /// Worker threads for loading documentation sets (0 = one per core).
    #[arg(short = 'j', long)]
    threads: Option<usize>,
}

impl BuildArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = self.config.load(CliSettings {
            output_dir: self.output_dir,
            checkouts_dir: self.checkouts_dir,
            strict: self.strict.then_some(true),
            threads: self.threads,
            ..CliSettings::default()
        })?;

        output.info(&format!(
            "Navigation: {}",
            config.build_resolved.navigation_file.display()
        ));
        output.info(&format!("Output: {}", config.build_resolved.output_dir.display()));

        let diagnostics = DiagnosticsCollector::new();
        let result = AssemblerBuild::new(config).run(&CancellationToken::new(), &diagnostics);
        output.diagnostics(&diagnostics);
        let report = result?;

        if !report.success {
            return Err(CliError::Failed(format!(
                "build failed with {} error(s) and {} warning(s)",
                report.errors, report.warnings
            )));
        }
        output.success(&format!(
            "Assembled {} pages from {} documentation sets into {}",
            report.pages,
            report.sets,
            report.output_dir.display()
        ));
        Ok(())
    }
}
