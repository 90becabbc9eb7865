//! Content cache: memoized analyzer output keyed by file content.
//!
//! The cache knows nothing about project structure. Entries are keyed by
//! `(language, analyzer version, content hash)` and hold path-independent
//! [`FileFacts`], so two files with identical bytes share one entry and a
//! renamed file is still a hit. Clearing the cache at any time only costs
//! re-analysis, never correctness.
//!
//! Memory is bounded by an LRU policy over entry count.

mod store;

pub use store::{CacheStore, LoadedEntries, SqliteCacheStore};

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tracing::trace;

use crate::types::{ContentHash, FileFacts, Language};

/// Identity of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Language whose analyzer produced the facts
    pub language: Language,
    /// Version of that analyzer's extraction logic
    pub analyzer_version: u32,
    /// Digest of the analyzed bytes
    pub content_hash: ContentHash,
}

impl CacheKey {
    /// Build a key from its parts.
    #[must_use]
    pub fn new(language: Language, analyzer_version: u32, content_hash: ContentHash) -> Self {
        Self {
            language,
            analyzer_version,
            content_hash,
        }
    }
}

/// Counters describing cache effectiveness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries currently held
    pub entries: usize,
    /// Maximum entries before eviction
    pub capacity: usize,
    /// Lookups that found an entry
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Entries dropped to stay within capacity
    pub evictions: u64,
}

impl CacheStats {
    /// Fraction of lookups that hit, or 0 when nothing was looked up.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Bounded LRU map from [`CacheKey`] to analyzer output.
#[derive(Debug)]
pub struct ContentCache {
    entries: LruCache<CacheKey, Arc<FileFacts>>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl ContentCache {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Look up facts for a key, marking the entry as recently used.
    pub fn get(&mut self, key: &CacheKey) -> Option<Arc<FileFacts>> {
        if let Some(facts) = self.entries.get(key) {
            self.hits += 1;
            Some(Arc::clone(facts))
        } else {
            self.misses += 1;
            None
        }
    }

    /// Whether an entry exists, without touching recency or counters.
    #[must_use]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains(key)
    }

    /// Store facts for a key, evicting the least recently used entry if full.
    pub fn put(&mut self, key: CacheKey, facts: Arc<FileFacts>) {
        if let Some((evicted, _)) = self.entries.push(key, facts) {
            // `push` hands back the old value when the key was already present
            if evicted != key {
                self.evictions += 1;
                trace!(content_hash = %evicted.content_hash, "Evicted cache entry");
            }
        }
    }

    /// Insert previously persisted entries, oldest first.
    ///
    /// Returns how many entries were inserted.
    pub fn warm(&mut self, entries: impl IntoIterator<Item = (CacheKey, FileFacts)>) -> usize {
        let mut count = 0;
        for (key, facts) in entries {
            self.put(key, Arc::new(facts));
            count += 1;
        }
        count
    }

    /// All entries ordered from least to most recently used.
    ///
    /// Feeding this back into [`ContentCache::warm`] restores recency order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(CacheKey, Arc<FileFacts>)> {
        self.entries
            .iter()
            .rev()
            .map(|(k, v)| (*k, Arc::clone(v)))
            .collect()
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            capacity: self.entries.cap().get(),
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DefinedSymbol, SymbolKind, Visibility};

    fn key(n: u64) -> CacheKey {
        CacheKey::new(Language::TypeScript, 1, ContentHash(n))
    }

    fn facts(name: &str) -> Arc<FileFacts> {
        Arc::new(FileFacts {
            symbols: vec![DefinedSymbol {
                name: name.to_string(),
                kind: SymbolKind::Function,
                line: 1,
                column: 1,
                visibility: Visibility::Public,
                container: None,
            }],
            ..FileFacts::default()
        })
    }

    #[test]
    fn get_counts_hits_and_misses() {
        let mut cache = ContentCache::new(4);
        cache.put(key(1), facts("a"));

        assert!(cache.get(&key(1)).is_some());
        assert!(cache.get(&key(2)).is_none());

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn version_and_language_are_part_of_the_key() {
        let mut cache = ContentCache::new(4);
        cache.put(key(1), facts("a"));

        assert!(!cache.contains(&CacheKey::new(Language::TypeScript, 2, ContentHash(1))));
        assert!(!cache.contains(&CacheKey::new(Language::Rust, 1, ContentHash(1))));
    }

    #[test]
    fn evicts_least_recently_used() {
        let mut cache = ContentCache::new(2);
        cache.put(key(1), facts("a"));
        cache.put(key(2), facts("b"));
        cache.get(&key(1));
        cache.put(key(3), facts("c"));

        assert!(cache.contains(&key(1)));
        assert!(!cache.contains(&key(2)));
        assert!(cache.contains(&key(3)));
        assert_eq!(cache.stats().evictions, 1);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn replacing_an_entry_is_not_an_eviction() {
        let mut cache = ContentCache::new(2);
        cache.put(key(1), facts("a"));
        cache.put(key(1), facts("b"));

        assert_eq!(cache.stats().evictions, 0);
        assert_eq!(cache.get(&key(1)).unwrap().symbols[0].name, "b");
    }

    #[test]
    fn snapshot_round_trips_recency() {
        let mut cache = ContentCache::new(3);
        cache.put(key(1), facts("a"));
        cache.put(key(2), facts("b"));
        cache.get(&key(1));

        let snapshot = cache.snapshot();
        assert_eq!(snapshot[0].0, key(2), "least recently used first");

        let mut restored = ContentCache::new(2);
        restored.warm(snapshot.into_iter().map(|(k, f)| (k, (*f).clone())));
        restored.put(key(3), facts("c"));

        assert!(restored.contains(&key(1)));
        assert!(!restored.contains(&key(2)));
    }

    #[test]
    fn clear_empties_but_keeps_counters() {
        let mut cache = ContentCache::new(2);
        cache.put(key(1), facts("a"));
        cache.get(&key(1));
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let cache = ContentCache::new(0);
        assert_eq!(cache.stats().capacity, 1);
    }
}
