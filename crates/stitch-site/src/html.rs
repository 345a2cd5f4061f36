//! Shared navigation HTML, one fragment per top-level root.

use std::fmt::Write;

use rayon::prelude::*;
use stitch_cache::{Cache, CacheBucket, CacheBucketExt};

use crate::compose::{ComposedItem, SiteRoot};

/// Cache bucket holding rendered fragments.
const BUCKET: &str = "navigation";

/// Render the navigation fragment of a root.
///
/// Hidden items are left out of the markup. Phantom roots render as an
/// empty string.
pub fn render_navigation(root: &SiteRoot) -> String {
    if root.is_phantom {
        return String::new();
    }
    let mut html = String::with_capacity(1024);
    let _ = writeln!(html, "<nav class=\"site-nav\" data-root=\"{}\">", escape(&root.source.to_string()));
    match &root.url {
        Some(url) => {
            let _ = writeln!(
                html,
                "<a class=\"site-nav-title\" href=\"{}\">{}</a>",
                escape(url),
                escape(&root.title),
            );
        }
        None => {
            let _ = writeln!(html, "<span class=\"site-nav-title\">{}</span>", escape(&root.title));
        }
    }
    html.push_str("<ul>\n");
    render_items(&mut html, &root.items);
    html.push_str("</ul>\n</nav>\n");
    html
}

fn render_items(html: &mut String, items: &[ComposedItem]) {
    for item in items.iter().filter(|item| !item.is_hidden()) {
        let class = match item {
            ComposedItem::Page { .. } => "page",
            ComposedItem::Group { .. } => "group",
            ComposedItem::CrossLink { .. } => "crosslink",
            ComposedItem::External { .. } => "external",
        };
        let _ = write!(html, "<li class=\"{class}\">");
        match item.url() {
            Some(url) => {
                let _ = write!(html, "<a href=\"{}\">{}</a>", escape(url), escape(item.title()));
            }
            None => {
                let _ = write!(html, "<span>{}</span>", escape(item.title()));
            }
        }

        let children = item.children();
        if children.iter().any(|child| !child.is_hidden()) {
            html.push_str("\n<ul>\n");
            render_items(html, children);
            html.push_str("</ul>\n");
        }
        html.push_str("</li>\n");
    }
}

/// Navigation HTML renderer memoized in a [`Cache`].
///
/// Fragments are keyed by the root's moniker. Two threads missing the same
/// key both render and the last one stores; rendering is deterministic so
/// either value is correct.
pub struct NavigationHtml {
    bucket: Box<dyn CacheBucket>,
}

impl NavigationHtml {
    pub fn new(cache: &dyn Cache) -> Self {
        Self {
            bucket: cache.bucket(BUCKET),
        }
    }

    pub fn render(&self, root: &SiteRoot) -> String {
        if root.is_phantom {
            return String::new();
        }
        self.bucket
            .get_or_insert_string(&root.source.canonical(), "", || render_navigation(root))
    }

    /// Render every root in parallel; the result keeps the input order.
    pub fn render_all(&self, roots: &[SiteRoot]) -> Vec<String> {
        roots.par_iter().map(|root| self.render(root)).collect()
    }
}

/// Escape HTML special characters.
fn escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;
    use pretty_assertions::assert_eq;
    use stitch_cache::{MemoryCache, NullCache};
    use stitch_toc::Moniker;

    fn root(items: Vec<ComposedItem>) -> SiteRoot {
        SiteRoot {
            source: Moniker::parse("kibana://").unwrap(),
            title: "Kibana & friends".to_owned(),
            url: Some("/docs/kibana".to_owned()),
            items,
            is_phantom: false,
        }
    }

    fn page(title: &str, url: &str, hidden: bool) -> ComposedItem {
        ComposedItem::Page {
            title: title.to_owned(),
            url: url.to_owned(),
            hidden,
        }
    }

    #[test]
    fn test_render_nested_items() {
        let root = root(vec![
            page("Discover", "/docs/kibana/discover", false),
            ComposedItem::Group {
                title: "API".to_owned(),
                url: None,
                hidden: false,
                source: None,
                children: vec![page("<Search>", "/docs/kibana/api/search", false)],
            },
        ]);
        assert_eq!(
            render_navigation(&root),
            "<nav class=\"site-nav\" data-root=\"kibana://\">\n\
             <a class=\"site-nav-title\" href=\"/docs/kibana\">Kibana &amp; friends</a>\n\
             <ul>\n\
             <li class=\"page\"><a href=\"/docs/kibana/discover\">Discover</a></li>\n\
             <li class=\"group\"><span>API</span>\n\
             <ul>\n\
             <li class=\"page\"><a href=\"/docs/kibana/api/search\">&lt;Search&gt;</a></li>\n\
             </ul>\n\
             </li>\n\
             </ul>\n\
             </nav>\n"
        );
    }

    #[test]
    fn test_hidden_items_are_not_rendered() {
        let html = render_navigation(&root(vec![
            page("Discover", "/docs/kibana/discover", false),
            page("Secret", "/docs/kibana/secret", true),
        ]));
        assert!(html.contains("Discover"));
        assert!(!html.contains("Secret"));
    }

    #[test]
    fn test_phantom_renders_empty() {
        let mut phantom = root(Vec::new());
        phantom.is_phantom = true;
        assert_eq!(render_navigation(&phantom), "");
        assert_eq!(NavigationHtml::new(&NullCache).render(&phantom), "");
    }

    #[test]
    fn test_render_is_memoized_per_root() {
        let cache = MemoryCache::new();
        let renderer = NavigationHtml::new(&cache);
        let first = renderer.render(&root(vec![page("Discover", "/docs/kibana/discover", false)]));
        // A second render of the same root is served from the cache.
        let second = renderer.render(&root(Vec::new()));
        assert_eq!(first, second);
        assert_eq!(cache.len(BUCKET), 1);
    }

    #[test]
    fn test_render_all_keeps_order_and_skips_phantoms() {
        let fixture = Fixture::standard();
        let roots = fixture.compose();
        let cache = MemoryCache::new();
        let html = NavigationHtml::new(&cache).render_all(&roots);

        assert_eq!(html.len(), roots.len());
        assert!(html[0].contains("data-root=\"narrative://get-started/\""));
        assert!(html[0].contains("/docs/get-started/elasticsearch/security"));
        let phantom = roots.iter().position(|r| r.is_phantom).unwrap();
        assert_eq!(html[phantom], "");
        assert!(html.iter().all(|fragment| !fragment.contains("Internal notes")));
        assert_eq!(cache.len(BUCKET), roots.len() - 1);
    }

    #[test]
    fn test_escape_special_characters() {
        assert_eq!(escape("<script>"), "&lt;script&gt;");
        assert_eq!(escape("a&b"), "a&amp;b");
        assert_eq!(escape("it's"), "it&#x27;s");
    }
}
