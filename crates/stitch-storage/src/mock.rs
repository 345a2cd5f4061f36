//! In-memory documentation source for tests.

use std::collections::{HashMap, HashSet};

use crate::source::{DocumentationSource, PageFacts, StorageError, StorageErrorKind};

/// Documentation set held in memory.
///
/// Files are listed in insertion order.
///
/// ```
/// use stitch_storage::{DocumentationSource, MockSource};
///
/// let source = MockSource::new("kibana")
///     .with_file("docset.yml", "toc:\n  - file: index.md\n")
///     .with_file("index.md", "# Kibana\n");
/// assert_eq!(source.list_files().unwrap(), vec!["docset.yml", "index.md"]);
/// ```
#[derive(Debug, Default)]
pub struct MockSource {
    name: String,
    order: Vec<String>,
    contents: HashMap<String, String>,
    facts: HashMap<String, PageFacts>,
    unreadable: HashSet<String>,
}

impl MockSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        if !self.contents.contains_key(&path) {
            self.order.push(path.clone());
        }
        self.contents.insert(path, content.into());
        self
    }

    /// Add a markdown page whose only content is an H1 title.
    #[must_use]
    pub fn with_page(self, path: impl Into<String>, title: &str) -> Self {
        self.with_file(path, format!("# {title}\n"))
    }

    /// Override the facts returned for `facts.relative_path`.
    #[must_use]
    pub fn with_facts(mut self, facts: PageFacts) -> Self {
        if !self.contents.contains_key(&facts.relative_path) {
            self.order.push(facts.relative_path.clone());
            self.contents.insert(facts.relative_path.clone(), String::new());
        }
        self.facts.insert(facts.relative_path.clone(), facts);
        self
    }

    /// List the file but fail every read of it.
    #[must_use]
    pub fn with_unreadable(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        if !self.contents.contains_key(&path) {
            self.order.push(path.clone());
            self.contents.insert(path.clone(), String::new());
        }
        self.unreadable.insert(path);
        self
    }
}

impl DocumentationSource for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_files(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.order.clone())
    }

    fn read(&self, path: &str) -> Result<String, StorageError> {
        if self.unreadable.contains(path) {
            return Err(StorageError::new(StorageErrorKind::PermissionDenied)
                .with_path(path)
                .with_backend("mock"));
        }
        self.contents
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::not_found(path).with_backend("mock"))
    }

    fn exists(&self, path: &str) -> bool {
        self.contents.contains_key(path)
    }

    fn page_facts(&self, path: &str) -> Result<PageFacts, StorageError> {
        if let Some(facts) = self.facts.get(path) {
            return Ok(facts.clone());
        }
        let content = self.read(path)?;
        Ok(crate::facts::extract_facts(path, &content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pages_and_facts() {
        let source = MockSource::new("kibana")
            .with_page("index.md", "Kibana")
            .with_facts(PageFacts {
                relative_path: "setup.md".to_owned(),
                title: "Set up".to_owned(),
                hidden: true,
                ..PageFacts::default()
            });

        assert_eq!(source.name(), "kibana");
        assert_eq!(source.list_files().unwrap(), vec!["index.md", "setup.md"]);
        assert_eq!(source.page_facts("index.md").unwrap().title, "Kibana");
        assert!(source.page_facts("setup.md").unwrap().hidden);
    }

    #[test]
    fn test_unreadable_file_is_listed_but_fails() {
        let source = MockSource::new("x").with_unreadable("broken.md");
        assert!(source.exists("broken.md"));
        let err = source.page_facts("broken.md").unwrap_err();
        assert_eq!(err.kind, StorageErrorKind::PermissionDenied);
    }

    #[test]
    fn test_missing_file() {
        let source = MockSource::new("x");
        assert!(source.read("nope.md").unwrap_err().is_not_found());
    }
}
