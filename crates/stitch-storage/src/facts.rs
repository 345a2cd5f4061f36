//! Page fact extraction from markdown text.
//!
//! Only what the assembler needs is read: YAML front matter (`title`,
//! `navigation_title`, `hidden`), the first H1 as a title fallback, and the
//! anchors of every heading. A heading that ends with `[custom-id]` declares
//! that id; otherwise the anchor is a slug of the heading text.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::source::PageFacts;

static H1_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#[ \t]+(.+)$").expect("invalid h1 regex"));

static HEADING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^#{1,6}[ \t]+(.+?)(?:[ \t]+\[([A-Za-z0-9_-]+)\])?[ \t]*$").expect("invalid heading regex")
});

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FrontMatter {
    title: Option<String>,
    navigation_title: Option<String>,
    hidden: bool,
}

/// Split `---` delimited front matter from the body.
fn split_front_matter(content: &str) -> (Option<&str>, &str) {
    let Some(rest) = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    else {
        return (None, content);
    };
    match rest.find("\n---") {
        Some(end) => {
            let body = &rest[end + 4..];
            let body = body.split_once('\n').map_or("", |(_, body)| body);
            (Some(&rest[..end]), body)
        }
        None => (None, content),
    }
}

/// Build [`PageFacts`] for the page at `path`.
pub fn extract_facts(path: &str, content: &str) -> PageFacts {
    let (front_matter, body) = split_front_matter(content);
    let front_matter: FrontMatter = front_matter
        .and_then(|yaml| match serde_yaml::from_str(yaml) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!(path, error = %e, "Failed to parse front matter");
                None
            }
        })
        .unwrap_or_default();

    let title = front_matter
        .title
        .or_else(|| {
            H1_PATTERN
                .captures(body)
                .and_then(|caps| caps.get(1))
                .map(|m| strip_custom_id(m.as_str().trim()).to_owned())
        })
        .unwrap_or_else(|| title_from_path(path));

    PageFacts {
        relative_path: path.to_owned(),
        title,
        navigation_title: front_matter.navigation_title,
        hidden: front_matter.hidden,
        url: markdown_path_to_url(path),
        anchors: extract_anchors(body),
    }
}

fn strip_custom_id(heading: &str) -> &str {
    match heading.rfind(" [") {
        Some(idx) if heading.ends_with(']') => heading[..idx].trim_end(),
        _ => heading,
    }
}

/// Anchors of every heading outside fenced code blocks.
pub fn extract_anchors(body: &str) -> Vec<String> {
    let mut anchors = Vec::new();
    let mut in_fence = false;
    let mut prose = String::new();
    for line in body.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if !in_fence {
            prose.push_str(line);
            prose.push('\n');
        }
    }
    for caps in HEADING_PATTERN.captures_iter(&prose) {
        let anchor = match caps.get(2) {
            Some(id) => id.as_str().to_owned(),
            None => slugify(&caps[1]),
        };
        if !anchor.is_empty() && !anchors.contains(&anchor) {
            anchors.push(anchor);
        }
    }
    anchors
}

/// Lowercase, alphanumerics kept, everything else collapsed into `-`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }
    slug
}

/// URL path of a markdown file: `.md` dropped, `index` pages map to their
/// directory.
pub fn markdown_path_to_url(path: &str) -> String {
    let path = path.trim_matches('/');
    let path = path.strip_suffix(".md").unwrap_or(path);
    let path = if path == "index" {
        ""
    } else {
        path.strip_suffix("/index").unwrap_or(path)
    };
    format!("/{path}")
}

/// Title derived from the file name, e.g. `getting-started.md` to
/// `Getting Started`.
pub fn title_from_path(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    let name = name.strip_suffix(".md").unwrap_or(name);
    let mut result = String::with_capacity(name.len());
    for word in name.split(['-', '_', ' ']).filter(|w| !w.is_empty()) {
        if !result.is_empty() {
            result.push(' ');
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            result.extend(first.to_uppercase());
            result.push_str(chars.as_str());
        }
    }
    result
}
