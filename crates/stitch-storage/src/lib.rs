//! Documentation set sources for the stitch assembler.
//!
//! The assembler never parses page bodies. It sees each repository's
//! documentation set through the [`DocumentationSource`] trait: a flat list of
//! files, their contents on demand, and a minimal [`PageFacts`] sheet per
//! markdown page (title, navigation title, hidden flag, URL, anchors).
//!
//! # Implementations
//!
//! - [`FsSource`]: a checkout directory on disk
//! - [`MockSource`]: in-memory set for tests (behind the `mock` feature)

pub mod facts;
mod fs;
#[cfg(feature = "mock")]
mod mock;
mod source;

pub use fs::FsSource;
#[cfg(feature = "mock")]
pub use mock::MockSource;
pub use source::{DocumentationSource, PageFacts, StorageError, StorageErrorKind};
