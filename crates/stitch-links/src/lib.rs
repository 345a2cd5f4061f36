//! Link and output path resolution against the frozen TOC registry.
//!
//! - [`CrossLinkResolver`]: `repo://path#anchor` to published URL
//! - [`OutputPathResolver`]: `(set, relative path)` to output file and URL
//! - [`LinkIndex`]: per-repository published pages and anchors
//! - [`PrefixChecker`]: detects URL paths claimed by two repositories

mod crosslink;
mod link_index;
mod output;
mod prefix_checker;
mod uri;

pub use crosslink::CrossLinkResolver;
pub use link_index::{LinkIndex, PageLinks, RepositoryLinks};
pub use output::{OutputFile, OutputPathResolver};
pub use prefix_checker::PrefixChecker;
pub use uri::{UrlBuilder, join_segments, strip_segment_prefix, to_target_url_path};
