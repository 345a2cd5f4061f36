//! In-memory cache shared by every thread of a build.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::{Cache, CacheBucket};

#[derive(Debug, Clone)]
struct Entry {
    etag: String,
    value: Vec<u8>,
}

type Store = Arc<RwLock<HashMap<String, HashMap<String, Entry>>>>;

/// Process-local [`Cache`]; buckets with the same name share one map.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    store: Store,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in a bucket.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn len(&self, bucket: &str) -> usize {
        self.store
            .read()
            .unwrap()
            .get(bucket)
            .map_or(0, HashMap::len)
    }
}

impl Cache for MemoryCache {
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket> {
        Box::new(MemoryBucket {
            name: name.to_owned(),
            store: Arc::clone(&self.store),
        })
    }
}

struct MemoryBucket {
    name: String,
    store: Store,
}

impl CacheBucket for MemoryBucket {
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>> {
        let store = self.store.read().unwrap();
        let entry = store.get(&self.name)?.get(key)?;
        if !etag.is_empty() && entry.etag != etag {
            tracing::debug!(bucket = %self.name, key, "Cache etag mismatch");
            return None;
        }
        Some(entry.value.clone())
    }

    fn set(&self, key: &str, etag: &str, value: &[u8]) {
        let mut store = self.store.write().unwrap();
        store.entry(self.name.clone()).or_default().insert(
            key.to_owned(),
            Entry {
                etag: etag.to_owned(),
                value: value.to_vec(),
            },
        );
    }
}
