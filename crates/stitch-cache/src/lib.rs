//! Cache abstraction for artifacts shared across a build.
//!
//! - [`Cache`]: factory for named buckets
//! - [`CacheBucket`]: byte store keyed by `(key, etag)`
//! - [`CacheBucketExt`]: string helpers over any bucket
//!
//! # Implementations
//!
//! - [`NullCache`]: always misses
//! - [`MemoryCache`]: process-local map; concurrent writers of the same key
//!   race and the last store wins
//!
//! ```
//! use stitch_cache::{Cache, CacheBucketExt, MemoryCache};
//!
//! let cache = MemoryCache::new();
//! let bucket = cache.bucket("navigation");
//! bucket.set_string("narrative://get-started/", "", "<nav></nav>");
//! assert_eq!(bucket.get_string("narrative://get-started/", "").as_deref(), Some("<nav></nav>"));
//! ```

mod ext;
mod memory;

pub use ext::CacheBucketExt;
pub use memory::MemoryCache;

/// A named partition within a [`Cache`].
///
/// A hit requires both the key and the etag to match. An empty etag on
/// `get` skips etag validation.
pub trait CacheBucket: Send + Sync {
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>>;

    /// Store a value, replacing any previous entry for `key`.
    fn set(&self, key: &str, etag: &str, value: &[u8]);
}

/// Factory for named [`CacheBucket`]s.
///
/// Handles returned for the same name share storage.
pub trait Cache: Send + Sync {
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket>;
}

/// [`CacheBucket`] that stores nothing.
pub struct NullCacheBucket;

impl CacheBucket for NullCacheBucket {
    fn get(&self, _key: &str, _etag: &str) -> Option<Vec<u8>> {
        None
    }

    fn set(&self, _key: &str, _etag: &str, _value: &[u8]) {}
}

/// [`Cache`] used when caching is disabled.
pub struct NullCache;

impl Cache for NullCache {
    fn bucket(&self, _name: &str) -> Box<dyn CacheBucket> {
        Box::new(NullCacheBucket)
    }
}
