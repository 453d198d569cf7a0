//! Delta cache with a last-write staleness check.
//!
//! An entry is valid while the time it was written is not older than the
//! source's last modification time. This is a timestamp heuristic, not a
//! content hash: a source rewritten within the same timestamp tick as the
//! cache write yields a stale hit.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::SystemTime;

use nalgebra::DMatrix;
use tracing::{debug, info};

use crate::delta::{compute_deltas, DeltaSequence};
use crate::error::Result;

/// A position sequence whose deltas can be cached.
pub trait DeltaSource {
    /// Identity of the source in the cache.
    type Key: Eq + Hash + Clone + Debug;

    /// Cache key for this source.
    fn cache_key(&self) -> Self::Key;

    /// Time of the last write to the source.
    ///
    /// # Errors
    ///
    /// Propagates collaborator errors (e.g. a missing file).
    fn last_modified(&self) -> Result<SystemTime>;

    /// Load the raw `rows x channels` sequence.
    ///
    /// # Errors
    ///
    /// Propagates collaborator errors.
    fn load(&self) -> Result<DMatrix<f64>>;
}

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that recomputed the deltas.
    pub misses: u64,
}

#[derive(Debug)]
struct CachedDeltas {
    written_at: SystemTime,
    deltas: Arc<DeltaSequence>,
}

/// In-memory delta cache keyed by source identity.
#[derive(Debug)]
pub struct DeltaCache<K> {
    entries: HashMap<K, CachedDeltas>,
    stats: CacheStats,
}

impl<K> Default for DeltaCache<K> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::default(),
        }
    }
}

impl<K: Eq + Hash + Clone + Debug> DeltaCache<K> {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return cached deltas for `source`, recomputing them when the source
    /// was modified after the cache entry was written.
    ///
    /// # Errors
    ///
    /// Propagates errors from the source and from [`compute_deltas`].
    pub fn get_or_compute<S>(&mut self, source: &S) -> Result<Arc<DeltaSequence>>
    where
        S: DeltaSource<Key = K>,
    {
        let key = source.cache_key();
        let modified = source.last_modified()?;

        if let Some(entry) = self.entries.get(&key) {
            if entry.written_at >= modified {
                debug!(?key, "using cached deltas");
                self.stats.hits += 1;
                return Ok(Arc::clone(&entry.deltas));
            }
        }

        info!(?key, "recalculating deltas");
        let deltas = Arc::new(compute_deltas(&source.load()?)?);
        self.entries.insert(
            key,
            CachedDeltas {
                written_at: SystemTime::now(),
                deltas: Arc::clone(&deltas),
            },
        );
        self.stats.misses += 1;
        Ok(deltas)
    }

    /// Drop the entry for `key`. Returns whether one existed.
    pub fn invalidate(&mut self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hit/miss counters since creation.
    #[must_use]
    pub const fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::time::{Duration, UNIX_EPOCH};

    struct FakeSource {
        name: &'static str,
        modified: SystemTime,
        loads: Cell<usize>,
        rows: usize,
    }

    impl FakeSource {
        fn new(name: &'static str, modified: SystemTime, rows: usize) -> Self {
            Self {
                name,
                modified,
                loads: Cell::new(0),
                rows,
            }
        }
    }

    impl DeltaSource for FakeSource {
        type Key = &'static str;

        fn cache_key(&self) -> Self::Key {
            self.name
        }

        fn last_modified(&self) -> Result<SystemTime> {
            Ok(self.modified)
        }

        fn load(&self) -> Result<DMatrix<f64>> {
            self.loads.set(self.loads.get() + 1);
            Ok(DMatrix::from_fn(self.rows, 4, |r, c| (r * (c + 1)) as f64))
        }
    }

    #[test]
    fn test_fresh_entry_is_reused() {
        let mut cache = DeltaCache::new();
        let source = FakeSource::new("reference", UNIX_EPOCH, 6);

        let first = cache.get_or_compute(&source).unwrap();
        let second = cache.get_or_compute(&source).unwrap();

        assert_eq!(first.shape(), (5, 4));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.loads.get(), 1);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn test_source_newer_than_cache_recomputes() {
        let mut cache = DeltaCache::new();
        let future = SystemTime::now() + Duration::from_secs(3600);
        let source = FakeSource::new("recording", future, 4);

        cache.get_or_compute(&source).unwrap();
        cache.get_or_compute(&source).unwrap();

        assert_eq!(source.loads.get(), 2);
        assert_eq!(cache.stats().misses, 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_keys_are_independent() {
        let mut cache = DeltaCache::new();
        let a = FakeSource::new("a", UNIX_EPOCH, 3);
        let b = FakeSource::new("b", UNIX_EPOCH, 8);

        assert_eq!(cache.get_or_compute(&a).unwrap().len(), 2);
        assert_eq!(cache.get_or_compute(&b).unwrap().len(), 7);
        assert_eq!(cache.len(), 2);

        assert!(cache.invalidate(&"a"));
        assert!(!cache.invalidate(&"a"));
        cache.get_or_compute(&a).unwrap();
        assert_eq!(a.loads.get(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }
}
