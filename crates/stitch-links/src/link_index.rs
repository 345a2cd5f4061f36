//! Published pages and anchors per repository.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Anchors declared by one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLinks {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anchors: Vec<String>,
}

/// Every page a repository publishes, keyed by relative path
/// (`reference/setup.md`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryLinks {
    pub links: BTreeMap<String, PageLinks>,
}

impl RepositoryLinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_page(&mut self, path: &str, anchors: Vec<String>) {
        self.links
            .insert(path.trim_matches('/').to_owned(), PageLinks { anchors });
    }

    #[must_use]
    pub fn with_page(mut self, path: &str, anchors: &[&str]) -> Self {
        self.add_page(path, anchors.iter().map(|a| (*a).to_owned()).collect());
        self
    }

    pub fn page(&self, path: &str) -> Option<&PageLinks> {
        self.links.get(path.trim_matches('/'))
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Link indexes of all repositories in the build.
///
/// Filled while sets resolve, then shared read-only.
#[derive(Debug, Clone, Default)]
pub struct LinkIndex {
    repositories: HashMap<String, RepositoryLinks>,
}

impl LinkIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, repository: impl Into<String>, links: RepositoryLinks) {
        self.repositories.insert(repository.into(), links);
    }

    #[must_use]
    pub fn with_repository(mut self, repository: &str, links: RepositoryLinks) -> Self {
        self.insert(repository, links);
        self
    }

    pub fn get(&self, repository: &str) -> Option<&RepositoryLinks> {
        self.repositories.get(repository)
    }

    pub fn contains(&self, repository: &str) -> bool {
        self.repositories.contains_key(repository)
    }

    /// Repositories sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RepositoryLinks)> {
        let mut repos: Vec<_> = self
            .repositories
            .iter()
            .map(|(name, links)| (name.as_str(), links))
            .collect();
        repos.sort_by_key(|(name, _)| *name);
        repos.into_iter()
    }
}
