//! CLI error types.

use stitch_config::ConfigError;
use stitch_site::BuildError;
use stitch_toc::MonikerError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Build(#[from] BuildError),

    #[error("{0}")]
    Moniker(#[from] MonikerError),

    #[error("{0}")]
    Failed(String),
}
