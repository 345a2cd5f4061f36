//! Global navigation composition and the assembler build.
//!
//! [`AssemblerBuild`] drives a whole run: validate the navigation
//! declaration, load every documentation set, then compose the
//! site-wide artifacts.
//!
//! - [`Composer`]: mounts per-set trees as [`SiteRoot`]s
//! - [`NavigationHtml`]: cached navigation fragment per root
//! - [`Sitemap`]: visible URLs with a last-modified stamp
//! - [`RedirectTable`]: published `from -> to` URLs
//!
//! ```ignore
//! let diagnostics = DiagnosticsCollector::new();
//! let report = AssemblerBuild::new(config).run(&CancellationToken::new(), &diagnostics)?;
//! ```

mod build;
mod compose;
mod error;
mod html;
mod redirects;
mod sitemap;
#[cfg(test)]
mod testing;

pub use build::{AssemblerBuild, BuildReport};
pub use compose::{ComposedItem, Composer, SiteRoot};
pub use error::BuildError;
pub use html::{NavigationHtml, render_navigation};
pub use redirects::RedirectTable;
pub use sitemap::Sitemap;
pub use stitch_nav::CancellationToken;
