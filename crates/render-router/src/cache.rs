//! Bounded cache of registration-table lookups.
//!
//! Only the outcome of consulting the registration table is stored here: a
//! found target or an explicit "not registered" marker. Pattern resolver and
//! convention results depend on the live object and are never cached.

use std::num::NonZeroUsize;

use lru::LruCache;
use serde::Serialize;

use crate::key::RegistrationKey;
use crate::target::RenderTarget;

/// Default number of keys kept before least-recently-used eviction.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// A cached table lookup: `Some(target)` when registered, `None` when the key
/// is known to be absent.
pub type CachedLookup = Option<RenderTarget>;

/// Counters exposed for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub capacity: usize,
}

/// LRU cache from [`RegistrationKey`] to [`CachedLookup`].
///
/// Hit and miss counters are cumulative across [`clear`](Self::clear).
#[derive(Debug)]
pub struct ResolutionCache {
    entries: LruCache<RegistrationKey, CachedLookup>,
    hits: u64,
    misses: u64,
}

impl ResolutionCache {
    /// Creates a cache holding at most `capacity` keys (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Looks up a key, refreshing its recency on a hit.
    pub fn get(&mut self, key: &RegistrationKey) -> Option<CachedLookup> {
        match self.entries.get(key) {
            Some(result) => {
                self.hits += 1;
                Some(result.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Stores a lookup outcome, evicting the least recently used key when full.
    pub fn put(&mut self, key: RegistrationKey, result: CachedLookup) {
        self.entries.put(key, result);
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            size: self.entries.len(),
            capacity: self.entries.cap().get(),
        }
    }
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
