//! Digest-keyed artifact cache.
//!
//! Concurrent extraction runs share one cache of previously uploaded
//! artifacts (rendered page images pushed to object storage). Lookups are
//! idempotent: the same content digest always resolves to the same handle,
//! so an artifact is never uploaded twice.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

const DEFAULT_CAPACITY: usize = 256;

/// Thread-safe LRU map from content digest to a stored-artifact URL.
pub struct ArtifactCache {
    entries: Mutex<LruCache<String, String>>,
}

impl ArtifactCache {
    /// Create a cache with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a cache holding at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Look up the stored URL for a digest.
    pub fn get(&self, digest: &str) -> Option<String> {
        self.entries.lock().get(digest).cloned()
    }

    /// Record the stored URL for a digest. Re-inserting the same digest is a
    /// no-op for callers: the first URL wins.
    pub fn insert(&self, digest: &str, url: &str) -> String {
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get(digest) {
            return existing.clone();
        }
        entries.put(digest.to_string(), url.to_string());
        url.to_string()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for ArtifactCache {
    fn default() -> Self {
        Self::new()
    }
}
