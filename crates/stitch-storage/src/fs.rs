//! Filesystem-backed documentation source.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::source::{DocumentationSource, StorageError, StorageErrorKind};

const BACKEND: &str = "fs";

/// Directories never treated as documentation.
const SKIPPED_DIRS: &[&str] = &["node_modules", "target", "vendor", "__pycache__"];

/// A documentation set rooted at a checkout directory.
///
/// Files are listed recursively; within each directory files come before
/// subdirectories and both are sorted by name. Dot-prefixed entries are
/// skipped. Underscore-prefixed files are kept because `_docset.yml`,
/// `_toc.yml` and `_redirects.yml` live there.
#[derive(Debug, Clone)]
pub struct FsSource {
    name: String,
    root: PathBuf,
}

impl FsSource {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    /// Open the documentation set of a repository checkout.
    ///
    /// Documentation lives in `docs/` when that directory holds a docset
    /// file, otherwise at the checkout root.
    pub fn for_checkout(name: impl Into<String>, checkout: &Path) -> Self {
        let docs = checkout.join("docs");
        let root = if ["docset.yml", "_docset.yml"]
            .iter()
            .any(|f| docs.join(f).is_file())
        {
            docs
        } else {
            checkout.to_path_buf()
        };
        Self::new(name, root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reject paths that escape the set root.
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
        if escapes {
            return Err(StorageError::new(StorageErrorKind::InvalidPath)
                .with_path(relative)
                .with_backend(BACKEND));
        }
        Ok(self.root.join(relative))
    }

    fn scan_directory(dir: &Path, prefix: &str, files: &mut Vec<String>) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "Failed to read directory");
                return;
            }
        };

        let mut entries: Vec<(String, bool)> = entries
            .filter_map(Result::ok)
            .map(|e| {
                let is_dir = e.file_type().is_ok_and(|t| t.is_dir());
                (e.file_name().to_string_lossy().into_owned(), is_dir)
            })
            .filter(|(name, is_dir)| {
                !name.starts_with('.') && !(*is_dir && SKIPPED_DIRS.contains(&name.as_str()))
            })
            .collect();
        entries.sort_by(|(a_name, a_dir), (b_name, b_dir)| {
            a_dir.cmp(b_dir).then_with(|| a_name.cmp(b_name))
        });

        for (name, is_dir) in entries {
            let relative = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}/{name}")
            };
            if is_dir {
                Self::scan_directory(&dir.join(&name), &relative, files);
            } else {
                files.push(relative);
            }
        }
    }
}

impl DocumentationSource for FsSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_files(&self) -> Result<Vec<String>, StorageError> {
        if !self.root.is_dir() {
            return Err(StorageError::not_found(&self.root).with_backend(BACKEND));
        }
        let mut files = Vec::new();
        Self::scan_directory(&self.root, "", &mut files);
        Ok(files)
    }

    fn read(&self, path: &str) -> Result<String, StorageError> {
        let full = self.resolve(path)?;
        fs::read_to_string(&full)
            .map_err(|e| StorageError::io(e, Some(PathBuf::from(path))).with_backend(BACKEND))
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_ok_and(|p| p.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_fs_source_is_send_sync() {
        assert_send_sync::<FsSource>();
    }

    fn write(root: &Path, path: &str, content: &str) {
        let full = root.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }

    #[test]
    fn test_list_files_orders_files_before_directories() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "z.md", "# Z");
        write(dir.path(), "a/index.md", "# A");
        write(dir.path(), "docset.yml", "toc: []");
        write(dir.path(), "a/b/deep.md", "# Deep");
        write(dir.path(), "a/images/logo.png", "png");

        let source = FsSource::new("test", dir.path());
        assert_eq!(
            source.list_files().unwrap(),
            vec![
                "docset.yml",
                "z.md",
                "a/index.md",
                "a/b/deep.md",
                "a/images/logo.png",
            ]
        );
    }

    #[test]
    fn test_list_files_skips_hidden_and_tooling_dirs() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), ".git/config", "");
        write(dir.path(), "node_modules/pkg/readme.md", "");
        write(dir.path(), "_docset.yml", "toc: []");

        let source = FsSource::new("test", dir.path());
        assert_eq!(source.list_files().unwrap(), vec!["_docset.yml"]);
    }

    #[test]
    fn test_list_files_missing_root() {
        let source = FsSource::new("gone", "/nonexistent/stitch/checkout");
        let err = source.list_files().unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_read_and_exists() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "guide/setup.md", "# Setup\n");
        let source = FsSource::new("test", dir.path());

        assert_eq!(source.read("guide/setup.md").unwrap(), "# Setup\n");
        assert!(source.exists("guide/setup.md"));
        assert!(!source.exists("guide"));
        assert!(!source.exists("missing.md"));
        assert!(source.read("missing.md").unwrap_err().is_not_found());
    }

    #[test]
    fn test_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let source = FsSource::new("test", dir.path().join("docs"));
        let err = source.read("../secret.md").unwrap_err();
        assert_eq!(err.kind, StorageErrorKind::InvalidPath);
        assert!(!source.exists("../secret.md"));
        assert!(source.read("/etc/passwd").is_err());
    }

    #[test]
    fn test_page_facts_from_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "reference/index.md", "# Reference\n\n## Query DSL\n");
        let source = FsSource::new("elasticsearch", dir.path());

        let facts = source.page_facts("reference/index.md").unwrap();
        assert_eq!(facts.title, "Reference");
        assert_eq!(facts.url, "/reference");
        assert_eq!(facts.anchors, vec!["reference", "query-dsl"]);
    }

    #[test]
    fn test_for_checkout_prefers_docs_dir_with_docset() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "docs/docset.yml", "toc: []");
        let source = FsSource::for_checkout("kibana", dir.path());
        assert_eq!(source.root(), dir.path().join("docs"));

        let bare = tempfile::tempdir().unwrap();
        write(bare.path(), "docset.yml", "toc: []");
        let source = FsSource::for_checkout("beats", bare.path());
        assert_eq!(source.root(), bare.path());
    }
}
