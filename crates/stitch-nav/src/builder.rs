//! Builds a [`NavigationTree`] from a set's local TOC files.
//!
//! Construction is single-threaded. Every item created takes the next value
//! of one position counter threaded through the whole walk, so positions are
//! dense and follow document order (a group precedes its index page, which
//! precedes its children).

use std::collections::HashSet;

use glob::Pattern;
use stitch_diagnostics::DiagnosticsSink;
use stitch_storage::DocumentationSource;
use stitch_toc::Moniker;

use crate::toc_file::{DOCSET_FILES, TOC_FILES, TocFile, TocItem, parse_toc_file};
use crate::tree::{CrossLinkLeaf, ExternalLeaf, FileLeaf, Group, NavId, NavKind, NavigationTree};

fn join(parent: &str, child: &str) -> String {
    let parent = parent.trim_matches('/');
    let child = child.trim_matches('/');
    match (parent.is_empty(), child.is_empty()) {
        (true, _) => child.to_owned(),
        (false, true) => parent.to_owned(),
        (false, false) => format!("{parent}/{child}"),
    }
}

fn dir_of(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

fn file_name(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}

fn is_index_page(path: &str) -> bool {
    file_name(path) == "index.md"
}

/// Where paths of the items being walked are anchored.
#[derive(Debug, Clone)]
struct Scope {
    /// Folder that file references and plain folder names are relative to.
    container: String,
    /// Directory of the TOC file; anchors folder and toc paths that contain a `/`.
    toc_dir: String,
    /// TOC file, for diagnostics.
    location: String,
}

impl Scope {
    /// File references always join onto the container, even when they name a
    /// subdirectory.
    fn resolve_file(&self, path: &str) -> String {
        join(&self.container, path)
    }

    fn resolve(&self, path: &str) -> String {
        if path.trim_matches('/').contains('/') {
            join(&self.toc_dir, path)
        } else {
            join(&self.container, path)
        }
    }

    fn with_container(&self, container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            ..self.clone()
        }
    }
}

/// Builds the navigation of one documentation set.
pub struct NavigationBuilder<'a> {
    source: &'a dyn DocumentationSource,
    diagnostics: &'a dyn DiagnosticsSink,
    set: String,
    listed: Vec<String>,
    available: HashSet<String>,
    excluded: HashSet<String>,
    tree: NavigationTree,
}

impl<'a> NavigationBuilder<'a> {
    /// Build the tree, or `None` (with an error reported) when the set has
    /// no docset file or nothing buildable in it.
    pub fn build(
        source: &'a dyn DocumentationSource,
        diagnostics: &'a dyn DiagnosticsSink,
    ) -> Option<NavigationTree> {
        let set = source.name().to_owned();
        let listed = match source.list_files() {
            Ok(files) => files,
            Err(e) => {
                diagnostics.error(&format!("{set}://"), &format!("failed to list files: {e}"));
                return None;
            }
        };

        let Some(docset_path) = DOCSET_FILES
            .iter()
            .copied()
            .find(|f| listed.iter().any(|l| l == f))
        else {
            diagnostics.error(&format!("{set}://"), "documentation set has no docset.yml");
            return None;
        };
        let location = format!("{set}://{docset_path}");
        let docset = match source.read(docset_path) {
            Ok(content) => match parse_toc_file(&content, &location, diagnostics) {
                Ok(docset) => docset,
                Err(e) => {
                    diagnostics.error(&location, &format!("docset file {e}"));
                    return None;
                }
            },
            Err(e) => {
                diagnostics.error(&location, &format!("failed to read docset file: {e}"));
                return None;
            }
        };

        let mut builder = Self {
            source,
            diagnostics,
            tree: NavigationTree::new(&set, docset.project.clone()),
            set,
            available: HashSet::new(),
            excluded: HashSet::new(),
            listed,
        };
        builder.apply_excludes(&docset, &location);

        let mut counter = 0;
        let root = builder.add(
            &mut counter,
            None,
            NavKind::Group(Group {
                toc_source: Some(Moniker::new(&builder.set, "").to_toc_source()),
                ..Group::default()
            }),
        );
        let scope = Scope {
            container: String::new(),
            toc_dir: String::new(),
            location: location.clone(),
        };
        let children = builder.build_items(&docset.items, &scope, root, &mut counter);
        if children.is_empty() {
            diagnostics.error(&location, "documentation set has no buildable navigation items");
            return None;
        }
        builder.set_children(root, children);
        builder.promote_index(root);

        tracing::debug!(set = %builder.set, items = counter, "Built navigation");
        Some(builder.tree)
    }

    fn apply_excludes(&mut self, docset: &TocFile, location: &str) {
        let patterns: Vec<Pattern> = docset
            .exclude
            .iter()
            .filter_map(|p| match Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    self.diagnostics
                        .warning(location, &format!("invalid exclude pattern '{p}': {e}"));
                    None
                }
            })
            .collect();
        for file in &self.listed {
            if patterns.iter().any(|p| p.matches(file)) {
                self.excluded.insert(file.clone());
            } else {
                self.available.insert(file.clone());
            }
        }
    }

    fn add(&mut self, counter: &mut u32, parent: Option<NavId>, kind: NavKind) -> NavId {
        let position = *counter;
        *counter += 1;
        self.tree.push(position, parent, kind)
    }

    fn add_file(&mut self, counter: &mut u32, parent: NavId, path: String, hidden: bool) -> NavId {
        self.add(counter, Some(parent), NavKind::File(FileLeaf { path, hidden }))
    }

    fn set_children(&mut self, group: NavId, children: Vec<NavId>) {
        if let Some(group) = self.tree.group_mut(group) {
            group.children = children;
        }
    }

    fn set_index(&mut self, group: NavId, index: NavId) {
        if let Some(group) = self.tree.group_mut(group) {
            group.index = Some(index);
        }
    }

    /// Without an explicit index, the first `index.md` child becomes it.
    fn promote_index(&mut self, id: NavId) {
        let Some(group) = self.tree.group(id) else {
            return;
        };
        if group.index.is_some() {
            return;
        }
        let Some(position) = group.children.iter().position(|child| {
            self.tree
                .file(*child)
                .is_some_and(|leaf| is_index_page(&leaf.path))
        }) else {
            return;
        };
        if let Some(group) = self.tree.group_mut(id) {
            let index = group.children.remove(position);
            group.index = Some(index);
        }
    }

    /// Report a referenced file that cannot be used.
    fn check_file(&self, path: &str, scope: &Scope) -> bool {
        if self.available.contains(path) {
            return true;
        }
        let message = if self.excluded.contains(path) {
            format!("'{path}' is excluded by the docset exclude patterns")
        } else {
            format!("'{path}' does not exist")
        };
        self.diagnostics.error(&scope.location, &message);
        false
    }

    fn build_items(
        &mut self,
        items: &[TocItem],
        scope: &Scope,
        parent: NavId,
        counter: &mut u32,
    ) -> Vec<NavId> {
        items
            .iter()
            .filter_map(|item| self.build_item(item, scope, parent, counter))
            .collect()
    }

    fn build_item(
        &mut self,
        item: &TocItem,
        scope: &Scope,
        parent: NavId,
        counter: &mut u32,
    ) -> Option<NavId> {
        match item {
            TocItem::File {
                path,
                hidden,
                children,
            } => self.build_file(path, *hidden, children, scope, parent, counter),
            TocItem::Folder {
                path,
                file,
                children,
            } => Some(self.build_folder(path, file.as_deref(), children, scope, parent, counter)),
            TocItem::Toc { path, children } => self.build_toc(path, children, scope, parent, counter),
            TocItem::CrossLink {
                target,
                title,
                hidden,
            } => match Moniker::parse(target) {
                Ok(moniker) => Some(self.add(
                    counter,
                    Some(parent),
                    NavKind::CrossLink(CrossLinkLeaf {
                        target: moniker,
                        title: title.clone().unwrap_or_else(|| target.clone()),
                        hidden: *hidden,
                    }),
                )),
                Err(e) => {
                    self.diagnostics
                        .error(&scope.location, &format!("invalid crosslink '{target}': {e}"));
                    None
                }
            },
            TocItem::Url { url, title } => Some(self.add(
                counter,
                Some(parent),
                NavKind::External(ExternalLeaf {
                    url: url.clone(),
                    title: title.clone().unwrap_or_else(|| url.clone()),
                }),
            )),
            TocItem::DetectionRules {
                folders,
                file,
                children,
            } => self.build_detection_rules(folders, file, children, scope, parent, counter),
        }
    }

    fn build_file(
        &mut self,
        path: &str,
        hidden: bool,
        children: &[TocItem],
        scope: &Scope,
        parent: NavId,
        counter: &mut u32,
    ) -> Option<NavId> {
        let full = scope.resolve_file(path);
        if !self.check_file(&full, scope) {
            return None;
        }
        if children.is_empty() {
            return Some(self.add_file(counter, parent, full, hidden));
        }
        if hidden {
            self.diagnostics.error(
                &scope.location,
                &format!("hidden page '{full}' can not have children, ignoring them"),
            );
            return Some(self.add_file(counter, parent, full, true));
        }

        let group = self.add(counter, Some(parent), NavKind::Group(Group::default()));
        let child_container = if scope.container.is_empty() {
            dir_of(&full).to_owned()
        } else {
            scope.container.clone()
        };
        let index = self.add_file(counter, group, full, false);
        self.set_index(group, index);
        let children = self.build_items(children, &scope.with_container(child_container), group, counter);
        self.set_children(group, children);
        Some(group)
    }

    fn build_folder(
        &mut self,
        path: &str,
        file: Option<&str>,
        children: &[TocItem],
        scope: &Scope,
        parent: NavId,
        counter: &mut u32,
    ) -> NavId {
        let folder = scope.resolve(path);
        let group = self.add(
            counter,
            Some(parent),
            NavKind::Group(Group {
                folder: Some(folder.clone()),
                ..Group::default()
            }),
        );

        let index_path = file.map(|f| join(&folder, f));
        if let Some(index_path) = &index_path
            && self.check_file(index_path, scope)
        {
            let index = self.add_file(counter, group, index_path.clone(), false);
            self.set_index(group, index);
        }

        let items = if children.is_empty() {
            self.discover_folder(&folder, index_path.as_deref(), scope, group, counter)
        } else {
            self.build_items(children, &scope.with_container(folder), group, counter)
        };
        self.set_children(group, items);
        self.promote_index(group);
        group
    }

    /// One leaf per markdown file directly inside `folder`, index page first.
    fn discover_folder(
        &mut self,
        folder: &str,
        explicit_index: Option<&str>,
        scope: &Scope,
        group: NavId,
        counter: &mut u32,
    ) -> Vec<NavId> {
        let mut pages: Vec<String> = self
            .listed
            .iter()
            .filter(|f| self.available.contains(*f))
            .filter(|f| dir_of(f) == folder && f.ends_with(".md"))
            .filter(|f| !file_name(f).starts_with(['_', '.']))
            .filter(|f| Some(f.as_str()) != explicit_index)
            .cloned()
            .collect();
        if pages.is_empty() && explicit_index.is_none() {
            self.diagnostics.warning(
                &scope.location,
                &format!("folder '{folder}' has no markdown files"),
            );
        }
        if let Some(i) = pages.iter().position(|p| is_index_page(p)) {
            let index = pages.remove(i);
            pages.insert(0, index);
        }
        pages
            .into_iter()
            .map(|page| self.add_file(counter, group, page, false))
            .collect()
    }

    fn build_toc(
        &mut self,
        path: &str,
        children: &[TocItem],
        scope: &Scope,
        parent: NavId,
        counter: &mut u32,
    ) -> Option<NavId> {
        let dir = scope.resolve(path);
        if !children.is_empty() {
            self.diagnostics.error(
                &scope.location,
                &format!("toc '{dir}' may not contain children, define them in '{dir}/toc.yml' instead"),
            );
            return None;
        }

        let Some(toc_path) = TOC_FILES
            .iter()
            .map(|f| join(&dir, f))
            .find(|p| self.listed.contains(p))
        else {
            self.diagnostics.error(
                &scope.location,
                &format!("table of contents file not found: {dir}/toc.yml"),
            );
            return None;
        };
        let location = format!("{}://{toc_path}", self.set);
        let toc = match self.source.read(&toc_path) {
            Ok(content) => match parse_toc_file(&content, &location, self.diagnostics) {
                Ok(toc) => toc,
                Err(e) => {
                    self.diagnostics.error(&location, &format!("toc file {e}"));
                    return None;
                }
            },
            Err(e) => {
                self.diagnostics
                    .error(&location, &format!("failed to read toc file: {e}"));
                return None;
            }
        };

        let group = self.add(
            counter,
            Some(parent),
            NavKind::Group(Group {
                toc_source: Some(Moniker::new(&self.set, dir.as_str()).to_toc_source()),
                ..Group::default()
            }),
        );
        let nested = Scope {
            container: dir.clone(),
            toc_dir: dir.clone(),
            location,
        };
        let items = self.build_items(&toc.items, &nested, group, counter);
        if items.is_empty() {
            self.diagnostics.error(
                &nested.location,
                &format!("table of contents '{dir}' has no children defined"),
            );
        }
        self.set_children(group, items);
        self.promote_index(group);
        Some(group)
    }

    fn build_detection_rules(
        &mut self,
        folders: &[String],
        file: &str,
        children: &[TocItem],
        scope: &Scope,
        parent: NavId,
        counter: &mut u32,
    ) -> Option<NavId> {
        let overview = scope.resolve(file);
        if !self.check_file(&overview, scope) {
            return None;
        }
        let base = dir_of(&overview).to_owned();
        let group = self.add(counter, Some(parent), NavKind::Group(Group::default()));
        let index = self.add_file(counter, group, overview, false);
        self.set_index(group, index);

        let mut items = self.build_items(children, &scope.with_container(base.clone()), group, counter);
        for folder in folders {
            let prefix = format!("{}/", join(&base, folder));
            let rules: Vec<String> = self
                .listed
                .iter()
                .filter(|f| self.available.contains(*f))
                .filter(|f| f.starts_with(&prefix) && f.ends_with(".toml"))
                .cloned()
                .collect();
            if rules.is_empty() {
                self.diagnostics.warning(
                    &scope.location,
                    &format!("detection rules folder '{}' has no rule files", prefix.trim_end_matches('/')),
                );
            }
            items.extend(
                rules
                    .into_iter()
                    .map(|rule| self.add_file(counter, group, rule, false)),
            );
        }
        self.set_children(group, items);
        Some(group)
    }
}
