//! Mounting of per-set navigation trees under the global declaration.
//!
//! Every top-level declaration becomes a [`SiteRoot`]. The root's items are
//! taken from the TOC group with the same source in that repository's tree,
//! and declared children are mounted wherever the declaration puts them,
//! which may be far from where the owning set keeps them.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use stitch_diagnostics::DiagnosticsSink;
use stitch_links::{CrossLinkResolver, OutputPathResolver};
use stitch_nav::{NavId, NavKind, ResolvedNavigation};
use stitch_storage::facts::title_from_path;
use stitch_toc::{Moniker, TocEntry, TocRegistry};

/// One entry of the composed navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComposedItem {
    Page {
        title: String,
        url: String,
        hidden: bool,
    },
    Group {
        title: String,
        /// URL of the group's index page.
        #[serde(skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        hidden: bool,
        /// Declared TOC this group mounts; `None` for folders and pages
        /// with children.
        #[serde(skip_serializing_if = "Option::is_none")]
        source: Option<Moniker>,
        children: Vec<ComposedItem>,
    },
    CrossLink {
        title: String,
        /// `None` when the target repository is unknown.
        #[serde(skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        hidden: bool,
    },
    External {
        title: String,
        url: String,
    },
}

impl ComposedItem {
    pub fn title(&self) -> &str {
        match self {
            Self::Page { title, .. }
            | Self::Group { title, .. }
            | Self::CrossLink { title, .. }
            | Self::External { title, .. } => title,
        }
    }

    pub fn is_hidden(&self) -> bool {
        match self {
            Self::Page { hidden, .. } | Self::Group { hidden, .. } | Self::CrossLink { hidden, .. } => *hidden,
            Self::External { .. } => false,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Page { url, .. } | Self::External { url, .. } => Some(url),
            Self::Group { url, .. } | Self::CrossLink { url, .. } => url.as_deref(),
        }
    }

    pub fn children(&self) -> &[ComposedItem] {
        match self {
            Self::Group { children, .. } => children,
            _ => &[],
        }
    }
}

/// A top-level mount of the assembled site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteRoot {
    pub source: Moniker,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub items: Vec<ComposedItem>,
    /// Phantom roots are reserved in the registry but never published.
    pub is_phantom: bool,
}

impl SiteRoot {
    /// File-name-safe form of the root's source, e.g.
    /// `narrative-get-started` for `narrative://get-started/`.
    pub fn slug(&self) -> String {
        let mut slug = self.source.scheme().to_owned();
        for segment in self.source.canonical_path().split('/').filter(|s| !s.is_empty()) {
            slug.push('-');
            slug.push_str(segment);
        }
        slug
    }
}

struct Heading {
    title: String,
    url: Option<String>,
    hidden: bool,
}

fn source_title(source: &Moniker) -> String {
    match source.canonical_path() {
        "" => source.scheme().to_owned(),
        path => title_from_path(path),
    }
}

/// Merges resolved set trees under their declared mount points.
pub struct Composer<'a> {
    registry: &'a TocRegistry,
    sets: &'a HashMap<String, ResolvedNavigation>,
    output: &'a OutputPathResolver,
    links: &'a CrossLinkResolver,
    diagnostics: &'a dyn DiagnosticsSink,
    skipped: HashSet<String>,
}

impl<'a> Composer<'a> {
    pub fn new(
        registry: &'a TocRegistry,
        sets: &'a HashMap<String, ResolvedNavigation>,
        output: &'a OutputPathResolver,
        links: &'a CrossLinkResolver,
        diagnostics: &'a dyn DiagnosticsSink,
    ) -> Self {
        Self {
            registry,
            sets,
            output,
            links,
            diagnostics,
            skipped: HashSet::new(),
        }
    }

    /// Repositories left out of the build on purpose; their mounts are
    /// dropped without an error.
    #[must_use]
    pub fn with_skipped<I, S>(mut self, repositories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skipped.extend(repositories.into_iter().map(Into::into));
        self
    }

    /// Compose every top-level declaration, in declaration order.
    ///
    /// Declarations that can not be mounted are reported and left out.
    pub fn compose(&self) -> Vec<SiteRoot> {
        self.registry
            .top_levels()
            .filter_map(|entry| self.root(entry))
            .collect()
    }

    fn root(&self, entry: &'a TocEntry) -> Option<SiteRoot> {
        if entry.is_phantom {
            return Some(SiteRoot {
                source: entry.source.clone(),
                title: source_title(&entry.source),
                url: None,
                items: Vec::new(),
                is_phantom: true,
            });
        }
        let (set, id) = self.locate(entry)?;

        let mut emitted = HashSet::from([entry.key()]);
        let mut items = self.declared_children(entry, &mut emitted);
        items.extend(self.members(set, id, entry, &mut emitted));

        if let [ComposedItem::Group { children, url: None, .. }] = items.as_slice()
            && children.is_empty()
        {
            tracing::debug!(root = %entry.source, "Collapsing root whose only child is an empty group");
            items.clear();
        }

        let heading = self.heading(set, id, &entry.source);
        Some(SiteRoot {
            source: entry.source.clone(),
            title: heading.title,
            url: heading.url,
            items,
            is_phantom: false,
        })
    }

    /// Resolved set and TOC group backing a declaration.
    fn locate(&self, entry: &TocEntry) -> Option<(&'a ResolvedNavigation, NavId)> {
        let scheme = entry.source.scheme();
        let Some(set) = self.sets.get(scheme) else {
            if self.skipped.contains(scheme) {
                tracing::debug!(source = %entry.source, "Repository is skipped, leaving its toc out");
            } else {
                self.diagnostics.error(
                    &entry.location,
                    &format!("'{}' can not be mounted, repository '{scheme}' has no navigation", entry.source),
                );
            }
            return None;
        };
        let Some(id) = set.tree().toc_group(&entry.source) else {
            self.diagnostics.error(
                &entry.location,
                &format!("'{}' is not a toc of the '{scheme}' documentation set", entry.source),
            );
            return None;
        };
        Some((set, id))
    }

    fn declared_children(&self, entry: &'a TocEntry, emitted: &mut HashSet<String>) -> Vec<ComposedItem> {
        self.registry
            .children_of(entry)
            .into_iter()
            .filter_map(|child| self.nested(child, emitted))
            .collect()
    }

    /// A declared, non-top-level TOC; `None` when it was already placed.
    fn nested(&self, entry: &'a TocEntry, emitted: &mut HashSet<String>) -> Option<ComposedItem> {
        if entry.is_phantom || !emitted.insert(entry.key()) {
            return None;
        }
        let (set, id) = self.locate(entry)?;
        let mut children = self.members(set, id, entry, emitted);
        children.extend(self.declared_children(entry, emitted));

        let heading = self.heading(set, id, &entry.source);
        Some(ComposedItem::Group {
            title: heading.title,
            url: heading.url,
            hidden: heading.hidden,
            source: Some(entry.source.clone()),
            children,
        })
    }

    /// Items of a tree group; `owner` is the declaration the group belongs to.
    fn members(
        &self,
        set: &'a ResolvedNavigation,
        id: NavId,
        owner: &'a TocEntry,
        emitted: &mut HashSet<String>,
    ) -> Vec<ComposedItem> {
        let Some(group) = set.tree().group(id) else {
            return Vec::new();
        };
        group
            .children
            .iter()
            .filter_map(|&child| self.item(set, child, owner, emitted))
            .collect()
    }

    fn item(
        &self,
        set: &'a ResolvedNavigation,
        id: NavId,
        owner: &'a TocEntry,
        emitted: &mut HashSet<String>,
    ) -> Option<ComposedItem> {
        match &set.tree().node(id)?.kind {
            NavKind::File(leaf) => {
                let facts = set.facts(id)?;
                let Some(url) = self.output.url_for(set.set_name(), &leaf.page_path()) else {
                    tracing::debug!(set = set.set_name(), path = %leaf.path, "Page has no mount point");
                    return None;
                };
                Some(ComposedItem::Page {
                    title: facts.display_title().to_owned(),
                    url,
                    hidden: leaf.hidden || facts.hidden,
                })
            }
            NavKind::Group(group) => {
                if let Some(source) = &group.toc_source {
                    let declared = self
                        .registry
                        .get(source)
                        .filter(|e| e.parent_source == owner.source && e.key() != owner.key());
                    let Some(declared) = declared else {
                        tracing::debug!(toc = %source, under = %owner.source, "Dropping toc not declared here");
                        return None;
                    };
                    return self.nested(declared, emitted);
                }
                let children = self.members(set, id, owner, emitted);
                let heading = self.heading(set, id, &owner.source);
                Some(ComposedItem::Group {
                    title: heading.title,
                    url: heading.url,
                    hidden: heading.hidden,
                    source: None,
                    children,
                })
            }
            NavKind::CrossLink(link) => {
                let location = format!("{}://", set.set_name());
                Some(ComposedItem::CrossLink {
                    title: link.title.clone(),
                    url: self.links.resolve(self.diagnostics, &location, &link.target),
                    hidden: link.hidden,
                })
            }
            NavKind::External(link) => Some(ComposedItem::External {
                title: link.title.clone(),
                url: link.url.clone(),
            }),
        }
    }

    /// Title, URL and visibility of a group, taken from its index page when
    /// it has one.
    fn heading(&self, set: &ResolvedNavigation, id: NavId, source: &Moniker) -> Heading {
        let tree = set.tree();
        let group = tree.group(id);
        let index = group
            .and_then(|g| g.index)
            .and_then(|index| Some((tree.file(index)?, set.facts(index)?)));

        let url = index.and_then(|(leaf, _)| self.output.url_for(set.set_name(), &leaf.page_path()));
        let title = index
            .map(|(_, facts)| facts.display_title().to_owned())
            .or_else(|| group.and_then(|g| g.folder.as_deref()).map(title_from_path))
            .or_else(|| tree.title().filter(|_| id == tree.root()).map(str::to_owned))
            .unwrap_or_else(|| source_title(source));
        let hidden = group.is_some_and(|g| g.hidden)
            || index.is_some_and(|(leaf, facts)| leaf.hidden || facts.hidden);
        Heading { title, url, hidden }
    }
}
