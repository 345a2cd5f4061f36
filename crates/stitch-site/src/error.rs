//! Build errors.

use std::io;
use std::path::PathBuf;

use stitch_nav::ResolveError;
use stitch_toc::{DeclarationError, PrefixValidationError};

/// Failures that stop an assembler build.
///
/// Problems inside individual documentation sets are never returned here;
/// they are reported as diagnostics and decide success at the end.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BuildError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Declaration(#[from] DeclarationError),
    #[error(transparent)]
    Prefixes(#[from] PrefixValidationError),
    #[error("build was cancelled")]
    Cancelled,
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("failed to serialize {artifact}: {source}")]
    Json {
        artifact: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write sitemap: {0}")]
    Sitemap(String),
}

impl BuildError {
    /// Whether the build stopped because its token was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Resolve(ResolveError::Cancelled))
    }
}
