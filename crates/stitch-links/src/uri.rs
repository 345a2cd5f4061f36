//! URL construction for the publish environment.

/// Builds published URLs from mount-relative paths.
///
/// A URL is `{base_url}/{path_prefix}/{path}`, with empty segments dropped.
/// Without a base URL the result is root-relative (`/docs/reference/setup`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlBuilder {
    base_url: Option<String>,
    path_prefix: String,
}

impl UrlBuilder {
    pub fn new(base_url: Option<&str>, path_prefix: Option<&str>) -> Self {
        Self {
            base_url: base_url
                .map(|u| u.trim_end_matches('/').to_owned())
                .filter(|u| !u.is_empty()),
            path_prefix: path_prefix.unwrap_or_default().trim_matches('/').to_owned(),
        }
    }

    /// Root-relative path for `path`, e.g. `/docs/reference/setup`.
    pub fn path(&self, path: &str) -> String {
        let mut out = String::from("/");
        for segment in [self.path_prefix.as_str(), path.trim_matches('/')] {
            if segment.is_empty() {
                continue;
            }
            if out.len() > 1 {
                out.push('/');
            }
            out.push_str(segment);
        }
        out
    }

    /// Absolute URL when a base URL is configured, else the root-relative path.
    pub fn url(&self, path: &str) -> String {
        let path = self.path(path);
        match &self.base_url {
            Some(base) => format!("{base}{path}"),
            None => path,
        }
    }
}

/// URL form of a repository-relative markdown path: `.md` dropped and
/// `index` pages collapsed onto their directory.
pub fn to_target_url_path(path: &str) -> String {
    let path = path.trim_matches('/');
    let path = path.strip_suffix(".md").unwrap_or(path);
    if path == "index" {
        return String::new();
    }
    path.strip_suffix("/index").unwrap_or(path).to_owned()
}

/// `path` with the segment-aligned `prefix` removed; `None` when `prefix`
/// does not own `path`.
pub fn strip_segment_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let path = path.trim_matches('/');
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        return Some(path);
    }
    if path == prefix {
        return Some("");
    }
    path.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('/'))
}

/// Join path segments with `/`, skipping empty ones.
pub fn join_segments(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
