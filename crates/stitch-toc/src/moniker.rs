//! Repository-scoped content addresses.
//!
//! A moniker has the textual form `repo://relative/path[#anchor]`. The scheme
//! names a repository, the remainder is a path inside that repository's
//! documentation set, and the optional fragment names an anchor on the page.
//!
//! Two forms exist side by side:
//!
//! - the *display* form keeps the path exactly as written, so diagnostics
//!   echo what the author typed;
//! - the *canonical* form is used for every lookup. It drops a leading `/`,
//!   a trailing `/`, a trailing `.md`, and any `/` left after that, so that
//!   `elasticsearch://reference/`, `elasticsearch://reference.md` and
//!   `elasticsearch://reference` are the same key.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

const SEPARATOR: &str = "://";

/// Error returned when text cannot be parsed as a [`Moniker`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum MonikerError {
    #[error("moniker is empty")]
    Empty,
    #[error("'{0}' has no repository scheme (expected repo://path)")]
    MissingScheme(String),
    #[error("'{value}' has an invalid repository scheme '{scheme}'")]
    InvalidScheme { value: String, scheme: String },
}

/// A `repo://path#anchor` address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Moniker {
    scheme: String,
    path: String,
    fragment: Option<String>,
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.' | '_'))
}

impl Moniker {
    /// Build a moniker from parts. The scheme is lower-cased.
    pub fn new(scheme: impl AsRef<str>, path: impl Into<String>) -> Self {
        Self {
            scheme: scheme.as_ref().to_ascii_lowercase(),
            path: path.into(),
            fragment: None,
        }
    }

    /// Parse text that must carry an explicit scheme.
    pub fn parse(value: &str) -> Result<Self, MonikerError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(MonikerError::Empty);
        }
        let Some((scheme, rest)) = value.split_once(SEPARATOR) else {
            return Err(MonikerError::MissingScheme(value.to_owned()));
        };
        if !is_valid_scheme(scheme) {
            return Err(MonikerError::InvalidScheme {
                value: value.to_owned(),
                scheme: scheme.to_owned(),
            });
        }
        let (path, fragment) = match rest.split_once('#') {
            Some((path, fragment)) => (path, Some(fragment.to_owned())),
            None => (rest, None),
        };
        let mut moniker = Self::new(scheme, path);
        moniker.fragment = fragment.filter(|f| !f.is_empty());
        Ok(moniker)
    }

    /// Parse text, treating a value without `://` as a path inside
    /// `default_scheme`.
    pub fn parse_or_bare(value: &str, default_scheme: &str) -> Result<Self, MonikerError> {
        if Self::is_bare(value) {
            let value = value.trim();
            if value.is_empty() {
                return Err(MonikerError::Empty);
            }
            return Self::parse(&format!("{default_scheme}{SEPARATOR}{value}"));
        }
        Self::parse(value)
    }

    /// Whether the text is a bare path rather than a `repo://` moniker.
    pub fn is_bare(value: &str) -> bool {
        !value.contains(SEPARATOR)
    }

    /// Repository name.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Path exactly as written.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    #[must_use]
    pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
        let fragment = fragment.into();
        self.fragment = (!fragment.is_empty()).then_some(fragment);
        self
    }

    #[must_use]
    pub fn without_fragment(&self) -> Self {
        Self {
            scheme: self.scheme.clone(),
            path: self.path.clone(),
            fragment: None,
        }
    }

    /// Lookup form of the path.
    pub fn canonical_path(&self) -> &str {
        let path = self.path.trim_start_matches('/').trim_end_matches('/');
        path.strip_suffix(".md").unwrap_or(path).trim_end_matches('/')
    }

    /// Lookup key, `scheme://canonical_path`, without fragment.
    pub fn canonical(&self) -> String {
        format!("{}{SEPARATOR}{}", self.scheme, self.canonical_path())
    }

    /// First segment of the canonical path.
    pub fn host(&self) -> &str {
        let path = self.canonical_path();
        path.split_once('/').map_or(path, |(host, _)| host)
    }

    /// Page path relative to the repository root, as published in link
    /// indexes (keeps the `.md` extension).
    pub fn page_path(&self) -> &str {
        self.path.trim_matches('/')
    }

    /// Normalized TOC source form: canonical path with a trailing slash.
    #[must_use]
    pub fn to_toc_source(&self) -> Self {
        let path = self.canonical_path();
        let path = if path.is_empty() {
            String::new()
        } else {
            format!("{path}/")
        };
        Self::new(&self.scheme, path)
    }

    /// Append a relative path below this moniker's canonical path.
    #[must_use]
    pub fn join(&self, child: &str) -> Self {
        let base = self.canonical_path();
        let child = child.trim_matches('/');
        let path = match (base.is_empty(), child.is_empty()) {
            (true, _) => child.to_owned(),
            (false, true) => base.to_owned(),
            (false, false) => format!("{base}/{child}"),
        };
        Self::new(&self.scheme, path)
    }
}

impl fmt::Display for Moniker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.scheme, self.path)?;
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

impl FromStr for Moniker {
    type Err = MonikerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Moniker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_full_moniker() {
        let moniker = Moniker::parse("elasticsearch://reference/setup.md#install").unwrap();
        assert_eq!(moniker.scheme(), "elasticsearch");
        assert_eq!(moniker.path(), "reference/setup.md");
        assert_eq!(moniker.fragment(), Some("install"));
        assert_eq!(moniker.to_string(), "elasticsearch://reference/setup.md#install");
    }

    #[test]
    fn test_scheme_is_lowercased() {
        let moniker = Moniker::parse("Kibana://Guide").unwrap();
        assert_eq!(moniker.scheme(), "kibana");
        assert_eq!(moniker.path(), "Guide");
    }

    #[test]
    fn test_empty_fragment_is_dropped() {
        let moniker = Moniker::parse("kibana://guide.md#").unwrap();
        assert_eq!(moniker.fragment(), None);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Moniker::parse("  "), Err(MonikerError::Empty));
        assert!(matches!(
            Moniker::parse("reference/setup.md"),
            Err(MonikerError::MissingScheme(_))
        ));
        assert!(matches!(
            Moniker::parse("9es://x"),
            Err(MonikerError::InvalidScheme { .. })
        ));
        assert!(matches!(
            Moniker::parse("://x"),
            Err(MonikerError::InvalidScheme { .. })
        ));
    }

    #[test]
    fn test_bare_path_uses_default_scheme() {
        let moniker = Moniker::parse_or_bare("get-started", "narrative").unwrap();
        assert_eq!(moniker.to_string(), "narrative://get-started");
        let explicit = Moniker::parse_or_bare("kibana://x", "narrative").unwrap();
        assert_eq!(explicit.scheme(), "kibana");
    }

    #[test]
    fn test_canonical_form() {
        let cases = [
            ("elasticsearch://reference/", "elasticsearch://reference"),
            ("elasticsearch://reference.md", "elasticsearch://reference"),
            ("elasticsearch://reference/setup.md", "elasticsearch://reference/setup"),
            ("elasticsearch:///reference//", "elasticsearch://reference"),
            ("elasticsearch://", "elasticsearch://"),
            ("elasticsearch://index.md/", "elasticsearch://index"),
        ];
        for (input, expected) in cases {
            let moniker = Moniker::parse(input).unwrap();
            assert_eq!(moniker.canonical(), expected, "canonical form of {input}");
        }
    }

    #[test]
    fn test_display_keeps_path_untouched() {
        let moniker = Moniker::parse("narrative://get-started/").unwrap();
        assert_eq!(moniker.to_string(), "narrative://get-started/");
        assert_eq!(moniker.canonical(), "narrative://get-started");
    }

    #[test]
    fn test_host_and_page_path() {
        let moniker = Moniker::parse("elasticsearch://reference/setup.md").unwrap();
        assert_eq!(moniker.host(), "reference");
        assert_eq!(moniker.page_path(), "reference/setup.md");
        let root = Moniker::parse("elasticsearch://").unwrap();
        assert_eq!(root.host(), "");
    }

    #[test]
    fn test_toc_source_form() {
        let moniker = Moniker::parse("narrative://get-started").unwrap();
        assert_eq!(moniker.to_toc_source().to_string(), "narrative://get-started/");
        let root = Moniker::parse("kibana://").unwrap();
        assert_eq!(root.to_toc_source().to_string(), "kibana://");
    }

    #[test]
    fn test_join() {
        let base = Moniker::parse("narrative://get-started/").unwrap();
        assert_eq!(base.join("install").to_string(), "narrative://get-started/install");
        let root = Moniker::parse("kibana://").unwrap();
        assert_eq!(root.join("/guide/").to_string(), "kibana://guide");
    }

    #[test]
    fn test_serializes_as_display_string() {
        let moniker = Moniker::parse("kibana://guide#top").unwrap();
        assert_eq!(serde_json::to_string(&moniker).unwrap(), r#""kibana://guide#top""#);
    }
}
