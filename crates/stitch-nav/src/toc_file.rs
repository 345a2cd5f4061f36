//! Local table of contents files (`docset.yml`, `toc.yml`).
//!
//! Like the global declaration, a TOC file is read into a [`serde_yaml::Value`]
//! tree and transformed into [`TocItem`]s. Only the document shape is fatal;
//! an unrecognized entry is a warning and is skipped.

use serde_yaml::{Mapping, Value};
use stitch_diagnostics::DiagnosticsSink;

/// Names of the set-level TOC file, in lookup order.
pub const DOCSET_FILES: &[&str] = &["docset.yml", "_docset.yml"];

/// Names of a nested TOC file, in lookup order.
pub const TOC_FILES: &[&str] = &["toc.yml", "_toc.yml"];

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TocFileError {
    #[error("not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("must be a mapping at the top level")]
    NotAMapping,
    #[error("has no 'toc' key")]
    MissingToc,
    #[error("'toc' must be a list of entries")]
    TocNotAList,
}

/// One entry of a local TOC.
///
/// Paths are as written, relative to the containing folder or TOC file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TocItem {
    /// `file:` or `hidden:`; with children it becomes the index of a group.
    File {
        path: String,
        hidden: bool,
        children: Vec<TocItem>,
    },
    /// `folder:`, optionally with an explicit index `file:`.
    Folder {
        path: String,
        file: Option<String>,
        children: Vec<TocItem>,
    },
    /// `toc:` naming a directory with its own TOC file.
    Toc { path: String, children: Vec<TocItem> },
    CrossLink {
        target: String,
        title: Option<String>,
        hidden: bool,
    },
    Url { url: String, title: Option<String> },
    /// `detection_rules:` folders of rule files beneath an overview page.
    DetectionRules {
        folders: Vec<String>,
        file: String,
        children: Vec<TocItem>,
    },
}

/// A parsed TOC file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TocFile {
    pub project: Option<String>,
    /// Glob patterns of excluded files; only honored in the docset file.
    pub exclude: Vec<String>,
    pub items: Vec<TocItem>,
}

#[derive(Default)]
struct ItemFields<'v> {
    file: Option<String>,
    hidden: Option<&'v Value>,
    folder: Option<String>,
    toc: Option<String>,
    crosslink: Option<String>,
    url: Option<String>,
    title: Option<String>,
    detection_rules: Option<Vec<String>>,
    children: Option<&'v Value>,
}

/// Parse a TOC file; `location` names it in diagnostics.
pub fn parse_toc_file(
    content: &str,
    location: &str,
    diagnostics: &dyn DiagnosticsSink,
) -> Result<TocFile, TocFileError> {
    let document: Value = serde_yaml::from_str(content)?;
    let Value::Mapping(root) = document else {
        return Err(TocFileError::NotAMapping);
    };

    let items = match root.get("toc") {
        None => return Err(TocFileError::MissingToc),
        Some(Value::Sequence(items)) => {
            ItemParser { location, diagnostics }.parse_items(items, "toc")
        }
        Some(_) => return Err(TocFileError::TocNotAList),
    };

    let project = root.get("project").and_then(Value::as_str).map(str::to_owned);
    let exclude = match root.get("exclude") {
        None => Vec::new(),
        Some(Value::Sequence(patterns)) => patterns
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
        Some(_) => {
            diagnostics.warning(location, "'exclude' is not a list, ignoring it");
            Vec::new()
        }
    };

    Ok(TocFile {
        project,
        exclude,
        items,
    })
}

struct ItemParser<'a> {
    location: &'a str,
    diagnostics: &'a dyn DiagnosticsSink,
}

impl ItemParser<'_> {
    fn warn(&self, breadcrumb: &str, message: &str) {
        self.diagnostics
            .warning(&format!("{}: {breadcrumb}", self.location), message);
    }

    fn parse_items(&self, items: &[Value], breadcrumb: &str) -> Vec<TocItem> {
        items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| self.parse_item(item, &format!("{breadcrumb}[{i}]")))
            .collect()
    }

    fn children(&self, fields: &ItemFields<'_>, breadcrumb: &str) -> Vec<TocItem> {
        match fields.children {
            None => Vec::new(),
            Some(Value::Sequence(items)) => {
                self.parse_items(items, &format!("{breadcrumb}.children"))
            }
            Some(_) => {
                self.warn(breadcrumb, "'children' is not a list, skipping children");
                Vec::new()
            }
        }
    }

    fn parse_item(&self, item: &Value, breadcrumb: &str) -> Option<TocItem> {
        let Value::Mapping(entry) = item else {
            self.warn(breadcrumb, "toc item is not a mapping, skipping it");
            return None;
        };
        let fields = self.read_fields(entry, breadcrumb);
        let children = self.children(&fields, breadcrumb);

        let hidden_path = fields.hidden.and_then(Value::as_str).map(str::to_owned);
        let hidden_flag = fields.hidden.and_then(Value::as_bool).unwrap_or(false);

        let item = match fields {
            ItemFields {
                folder: Some(path),
                file,
                ..
            } => TocItem::Folder {
                path,
                file,
                children,
            },
            ItemFields {
                detection_rules: Some(folders),
                file: Some(file),
                ..
            } => TocItem::DetectionRules {
                folders,
                file,
                children,
            },
            ItemFields {
                file: Some(path), ..
            } => {
                if let Some(hidden) = &hidden_path {
                    self.warn(
                        breadcrumb,
                        &format!("toc item defines both 'file: {path}' and 'hidden: {hidden}', using 'file'"),
                    );
                }
                TocItem::File {
                    path,
                    hidden: hidden_flag,
                    children,
                }
            }
            ItemFields {
                crosslink: Some(target),
                title,
                ..
            } => TocItem::CrossLink {
                target,
                title,
                hidden: hidden_flag,
            },
            ItemFields { toc: Some(path), .. } => TocItem::Toc { path, children },
            ItemFields {
                url: Some(url),
                title,
                ..
            } => TocItem::Url { url, title },
            _ => match hidden_path {
                Some(path) => TocItem::File {
                    path,
                    hidden: true,
                    children,
                },
                None => {
                    self.warn(breadcrumb, "toc item has no 'file', 'hidden', 'folder', 'toc', 'crosslink' or 'url' key");
                    return None;
                }
            },
        };
        Some(item)
    }

    fn read_fields<'v>(&self, entry: &'v Mapping, breadcrumb: &str) -> ItemFields<'v> {
        let mut fields = ItemFields::default();
        for (key, value) in entry {
            let Some(key) = key.as_str() else {
                self.warn(breadcrumb, "toc item has a non-string key, ignoring it");
                continue;
            };
            match key {
                "file" => fields.file = self.scalar(value, breadcrumb, key),
                "folder" => fields.folder = self.scalar(value, breadcrumb, key),
                "toc" => fields.toc = self.scalar(value, breadcrumb, key),
                "crosslink" => fields.crosslink = self.scalar(value, breadcrumb, key),
                "url" => fields.url = self.scalar(value, breadcrumb, key),
                "title" => fields.title = self.scalar(value, breadcrumb, key),
                "hidden" => fields.hidden = Some(value),
                "children" => fields.children = Some(value),
                "detection_rules" => {
                    fields.detection_rules = match value {
                        Value::Sequence(folders) => Some(
                            folders
                                .iter()
                                .filter_map(Value::as_str)
                                .map(str::to_owned)
                                .collect(),
                        ),
                        Value::String(folder) => Some(vec![folder.clone()]),
                        _ => {
                            self.warn(breadcrumb, "'detection_rules' must be a list of folders");
                            None
                        }
                    };
                }
                other => {
                    tracing::debug!(location = self.location, key = other, "Ignoring unknown toc item key");
                }
            }
        }
        fields
    }

    fn scalar(&self, value: &Value, breadcrumb: &str, key: &str) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => {
                self.warn(breadcrumb, &format!("'{key}' must be a string"));
                None
            }
        }
    }
}
