//! `stitch validate` command implementation.

use clap::Args;
use stitch_config::CliSettings;
use stitch_diagnostics::DiagnosticsCollector;
use stitch_site::AssemblerBuild;

use super::ConfigArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the validate command.
#[derive(Args)]
pub(crate) struct ValidateArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Treat warnings as failures.
    #[arg(long)]
    strict: bool,
}

impl ValidateArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = self.config.load(CliSettings {
            strict: self.strict.then_some(true),
            ..CliSettings::default()
        })?;
        let strict = config.build_resolved.strict;

        let diagnostics = DiagnosticsCollector::new();
        let result = AssemblerBuild::new(config).validate(&diagnostics);
        output.diagnostics(&diagnostics);
        let registry = result?;

        if !diagnostics.success(strict) {
            return Err(CliError::Failed("navigation is invalid".to_owned()));
        }
        output.success(&format!(
            "Navigation is valid: {} toc entries across {} repositories",
            registry.len(),
            registry.repositories().len()
        ));
        Ok(())
    }
}
