//! Set-level redirects (`_redirects.yml`).
//!
//! ```yaml
//! redirects:
//!   'old/page.md': 'new/page.md'
//!   'old/moved.md':
//!     to: 'elasticsearch://reference/moved.md'
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;
use stitch_storage::{DocumentationSource, StorageError};

/// Redirect file names, in lookup order.
pub const REDIRECT_FILES: &[&str] = &["_redirects.yml", "redirects.yml"];

/// One `from -> to` entry as written.
///
/// `from` is a path relative to the set root; `to` is either such a path
/// or an absolute moniker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub from: String,
    pub to: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RedirectsError {
    #[error("failed to read redirects file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: StorageError,
    },
    #[error("invalid redirects file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RedirectTarget {
    Path(String),
    Detailed { to: String },
}

#[derive(Deserialize)]
struct RedirectsFile {
    #[serde(default)]
    redirects: BTreeMap<String, RedirectTarget>,
}

/// Parse redirect file content; entries are sorted by `from`.
pub fn parse_redirects(path: &str, content: &str) -> Result<Vec<Redirect>, RedirectsError> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let file: RedirectsFile = serde_yaml::from_str(content).map_err(|source| RedirectsError::Parse {
        path: path.to_owned(),
        source,
    })?;
    Ok(file
        .redirects
        .into_iter()
        .map(|(from, target)| Redirect {
            from: from.trim_start_matches('/').to_owned(),
            to: match target {
                RedirectTarget::Path(to) | RedirectTarget::Detailed { to } => to,
            },
        })
        .collect())
}

/// Redirects of a documentation set; a set without a redirect file has none.
///
/// A redirect file that exists but can not be read is an error.
pub fn load_redirects(source: &dyn DocumentationSource) -> Result<Vec<Redirect>, RedirectsError> {
    let Some(path) = REDIRECT_FILES.iter().copied().find(|f| source.exists(f)) else {
        return Ok(Vec::new());
    };
    let content = source.read(path).map_err(|source| RedirectsError::Read {
        path: path.to_owned(),
        source,
    })?;
    parse_redirects(path, &content)
}
