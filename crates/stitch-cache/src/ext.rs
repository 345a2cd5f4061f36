//! String convenience methods for [`CacheBucket`].

use crate::CacheBucket;

/// Typed access on top of the byte-level [`CacheBucket`] API; implemented
/// for every bucket.
pub trait CacheBucketExt: CacheBucket {
    /// Cached UTF-8 string; `None` on miss or invalid UTF-8.
    fn get_string(&self, key: &str, etag: &str) -> Option<String> {
        String::from_utf8(self.get(key, etag)?).ok()
    }

    fn set_string(&self, key: &str, etag: &str, value: &str) {
        self.set(key, etag, value.as_bytes());
    }

    /// Cached string, or `compute` it and store the result.
    ///
    /// Two callers missing at the same time both compute; whichever stores
    /// last wins, so `compute` must be deterministic for a key.
    fn get_or_insert_string(&self, key: &str, etag: &str, compute: impl FnOnce() -> String) -> String {
        if let Some(hit) = self.get_string(key, etag) {
            return hit;
        }
        let value = compute();
        self.set_string(key, etag, &value);
        value
    }
}

impl<T: CacheBucket + ?Sized> CacheBucketExt for T {}
