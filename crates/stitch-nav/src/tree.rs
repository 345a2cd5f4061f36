//! Arena-backed navigation tree of one documentation set.

use std::collections::HashMap;

use stitch_toc::Moniker;

/// Index of an item in its [`NavigationTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NavId(pub(crate) u32);

impl NavId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One item of a navigation tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavNode {
    /// Dense creation order within the build.
    pub position: u32,
    /// Enclosing group; `None` only for the set root.
    pub parent: Option<NavId>,
    pub kind: NavKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavKind {
    Group(Group),
    File(FileLeaf),
    CrossLink(CrossLinkLeaf),
    External(ExternalLeaf),
}

/// An ordered list of children with an optional index page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Group {
    /// Index page; never listed in `children`.
    pub index: Option<NavId>,
    pub children: Vec<NavId>,
    /// Set when the group is the root of a TOC file (`kibana://reference/`).
    pub toc_source: Option<Moniker>,
    /// Folder path when the group comes from a `folder:` item.
    pub folder: Option<String>,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLeaf {
    /// Path relative to the set root.
    pub path: String,
    pub hidden: bool,
}

impl FileLeaf {
    /// Path of the page written for this leaf; rule files become markdown.
    pub fn page_path(&self) -> String {
        match self.path.strip_suffix(".toml") {
            Some(stem) => format!("{stem}.md"),
            None => self.path.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossLinkLeaf {
    pub target: Moniker,
    pub title: String,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalLeaf {
    pub url: String,
    pub title: String,
}

/// Navigation of one documentation set.
///
/// Items live in a flat vector in creation order; groups refer to their
/// children by [`NavId`] and every child knows its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTree {
    set_name: String,
    title: Option<String>,
    items: Vec<NavNode>,
    toc_groups: HashMap<String, NavId>,
}

impl NavigationTree {
    pub(crate) fn new(set_name: impl Into<String>, title: Option<String>) -> Self {
        Self {
            set_name: set_name.into(),
            title,
            items: Vec::new(),
            toc_groups: HashMap::new(),
        }
    }

    pub(crate) fn push(&mut self, position: u32, parent: Option<NavId>, kind: NavKind) -> NavId {
        let id = NavId(u32::try_from(self.items.len()).unwrap_or(u32::MAX));
        if let NavKind::Group(Group {
            toc_source: Some(source),
            ..
        }) = &kind
        {
            self.toc_groups.entry(source.canonical()).or_insert(id);
        }
        self.items.push(NavNode {
            position,
            parent,
            kind,
        });
        id
    }

    pub(crate) fn group_mut(&mut self, id: NavId) -> Option<&mut Group> {
        match &mut self.items.get_mut(id.index())?.kind {
            NavKind::Group(group) => Some(group),
            _ => None,
        }
    }

    pub fn set_name(&self) -> &str {
        &self.set_name
    }

    /// Project title from the docset file.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// The set root; always item zero.
    pub fn root(&self) -> NavId {
        NavId(0)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn node(&self, id: NavId) -> Option<&NavNode> {
        self.items.get(id.index())
    }

    pub fn group(&self, id: NavId) -> Option<&Group> {
        match &self.node(id)?.kind {
            NavKind::Group(group) => Some(group),
            _ => None,
        }
    }

    pub fn file(&self, id: NavId) -> Option<&FileLeaf> {
        match &self.node(id)?.kind {
            NavKind::File(leaf) => Some(leaf),
            _ => None,
        }
    }

    /// All items with their ids, in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (NavId, &NavNode)> {
        (0u32..).map(NavId).zip(&self.items)
    }

    /// Group rooted at the TOC with the given source.
    pub fn toc_group(&self, source: &Moniker) -> Option<NavId> {
        self.toc_groups.get(&source.canonical()).copied()
    }

    /// Every TOC group's source, in creation order.
    pub fn toc_sources(&self) -> Vec<&Moniker> {
        self.items
            .iter()
            .filter_map(|node| match &node.kind {
                NavKind::Group(Group {
                    toc_source: Some(source),
                    ..
                }) => Some(source),
                _ => None,
            })
            .collect()
    }

    /// Nearest enclosing TOC group of `id`, excluding `id` itself.
    pub fn enclosing_toc(&self, id: NavId) -> Option<NavId> {
        let mut current = self.node(id)?.parent;
        while let Some(parent) = current {
            if self.group(parent).is_some_and(|g| g.toc_source.is_some()) {
                return Some(parent);
            }
            current = self.node(parent)?.parent;
        }
        None
    }

    /// File leaves in creation order.
    pub fn files(&self) -> impl Iterator<Item = (NavId, &FileLeaf)> {
        self.iter().filter_map(|(id, node)| match &node.kind {
            NavKind::File(leaf) => Some((id, leaf)),
            _ => None,
        })
    }
}
