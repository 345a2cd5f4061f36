//! Sitemap of every visible published URL.

use std::collections::HashSet;

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::compose::{ComposedItem, SiteRoot};
use crate::error::BuildError;

const NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Deduplicated URLs in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sitemap {
    urls: Vec<String>,
}

impl Sitemap {
    /// Collect page and group index URLs of every non-phantom root.
    ///
    /// Hidden items (and everything below a hidden group), cross-links and
    /// external links are left out.
    pub fn from_roots(roots: &[SiteRoot]) -> Self {
        let mut collector = Collector::default();
        for root in roots.iter().filter(|root| !root.is_phantom) {
            if let Some(url) = &root.url {
                collector.push(url);
            }
            collector.items(&root.items);
        }
        Self { urls: collector.urls }
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Serialize as a sitemap `urlset`, stamping every URL with `lastmod`.
    pub fn to_xml(&self, lastmod: DateTime<Utc>) -> Result<String, BuildError> {
        let lastmod = lastmod.to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        let mut urlset = BytesStart::new("urlset");
        urlset.push_attribute(("xmlns", NAMESPACE));
        write(&mut writer, Event::Start(urlset))?;
        for url in &self.urls {
            write(&mut writer, Event::Start(BytesStart::new("url")))?;
            element(&mut writer, "loc", url)?;
            element(&mut writer, "lastmod", &lastmod)?;
            write(&mut writer, Event::End(BytesEnd::new("url")))?;
        }
        write(&mut writer, Event::End(BytesEnd::new("urlset")))?;

        String::from_utf8(writer.into_inner()).map_err(|e| BuildError::Sitemap(e.to_string()))
    }
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), BuildError> {
    writer
        .write_event(event)
        .map_err(|e| BuildError::Sitemap(e.to_string()))
}

fn element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<(), BuildError> {
    write(writer, Event::Start(BytesStart::new(name)))?;
    write(writer, Event::Text(BytesText::new(text)))?;
    write(writer, Event::End(BytesEnd::new(name)))
}

#[derive(Default)]
struct Collector {
    seen: HashSet<String>,
    urls: Vec<String>,
}

impl Collector {
    fn push(&mut self, url: &str) {
        if self.seen.insert(url.to_owned()) {
            self.urls.push(url.to_owned());
        }
    }

    fn items(&mut self, items: &[ComposedItem]) {
        for item in items.iter().filter(|item| !item.is_hidden()) {
            match item {
                ComposedItem::Page { url, .. } => self.push(url),
                ComposedItem::Group { url, children, .. } => {
                    if let Some(url) = url {
                        self.push(url);
                    }
                    self.items(children);
                }
                ComposedItem::CrossLink { .. } | ComposedItem::External { .. } => {}
            }
        }
    }
}
