//! Documentation source trait and error types.
//!
//! A [`DocumentationSource`] is one repository's documentation set as seen by
//! the assembler: a flat list of files addressed by forward-slash relative
//! paths (`reference/setup.md`), readable on demand, plus the per-page
//! [`PageFacts`] the navigation and link layers need.

use std::path::PathBuf;

use crate::facts;

/// Minimal per-page fact sheet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageFacts {
    /// Path relative to the documentation set root.
    pub relative_path: String,
    pub title: String,
    /// Shorter title used in navigation, from front matter.
    pub navigation_title: Option<String>,
    pub hidden: bool,
    /// URL of the page when the set is built on its own.
    pub url: String,
    /// Anchors declared on the page, in document order.
    pub anchors: Vec<String>,
}

impl PageFacts {
    /// Title shown in navigation.
    pub fn display_title(&self) -> &str {
        self.navigation_title.as_deref().unwrap_or(&self.title)
    }
}

#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    NotFound,
    PermissionDenied,
    InvalidPath,
    InvalidContent,
    Other,
}

/// Storage error with optional path, backend and cause.
#[derive(Debug)]
pub struct StorageError {
    pub kind: StorageErrorKind,
    pub path: Option<PathBuf>,
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            path: None,
            backend: None,
            source: None,
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(StorageErrorKind::NotFound).with_path(path)
    }

    /// Map an I/O error, keeping it as the cause.
    #[must_use]
    pub fn io(err: std::io::Error, path: Option<PathBuf>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => StorageErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => StorageErrorKind::PermissionDenied,
            std::io::ErrorKind::InvalidData => StorageErrorKind::InvalidContent,
            _ => StorageErrorKind::Other,
        };
        let mut error = Self::new(kind).with_source(err);
        if let Some(p) = path {
            error = error.with_path(p);
        }
        error
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == StorageErrorKind::NotFound
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // "[backend] Kind: cause (path: foo/bar.md)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StorageErrorKind::NotFound => "Not found",
            StorageErrorKind::PermissionDenied => "Permission denied",
            StorageErrorKind::InvalidPath => "Invalid path",
            StorageErrorKind::InvalidContent => "Invalid content",
            StorageErrorKind::Other => "Error",
        };
        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }
        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// One repository's documentation set.
///
/// Paths are relative, use `/` separators and never contain `..`.
pub trait DocumentationSource: Send + Sync {
    /// Documentation set name; also the repository's moniker scheme.
    fn name(&self) -> &str;

    /// Every file in the set, in discovery order.
    fn list_files(&self) -> Result<Vec<String>, StorageError>;

    fn read(&self, path: &str) -> Result<String, StorageError>;

    fn exists(&self, path: &str) -> bool;

    /// Facts for a markdown page.
    fn page_facts(&self, path: &str) -> Result<PageFacts, StorageError> {
        let content = self.read(path)?;
        Ok(facts::extract_facts(path, &content))
    }
}
