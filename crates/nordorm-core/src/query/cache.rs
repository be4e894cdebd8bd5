//! Translator cache: a bounded LRU map shared by every session of a factory.
//!
//! Lookup, insertion, and recency updates happen in one short critical
//! section. Translator compilation never runs under the lock.

use crate::query::{FilterTranslator, QueryTranslator};
use lru::LruCache;
use parking_lot::Mutex;
use std::{
    num::NonZeroUsize,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tracing::debug;

///
/// TranslationKey
///
/// Structural key over every field; keys differing only in the
/// shallow/scalar flag are distinct entries.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum TranslationKey {
    Query {
        query: String,
        shallow: bool,
    },
    Filter {
        role: String,
        query: String,
        scalar: bool,
    },
}

impl TranslationKey {
    #[must_use]
    pub fn query(query: impl Into<String>, shallow: bool) -> Self {
        Self::Query {
            query: query.into(),
            shallow,
        }
    }

    #[must_use]
    pub fn filter(role: impl Into<String>, query: impl Into<String>, scalar: bool) -> Self {
        Self::Filter {
            role: role.into(),
            query: query.into(),
            scalar,
        }
    }
}

///
/// CachedTranslator
///

#[derive(Clone, Debug)]
pub enum CachedTranslator {
    Query(Arc<dyn QueryTranslator>),
    Filter(Arc<dyn FilterTranslator>),
}

///
/// CacheLookup
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CacheLookup {
    Hit,
    Miss,
}

///
/// TranslatorCacheStats
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TranslatorCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub capacity: usize,
}

///
/// TranslatorCache
///
/// Once full, inserting a new key evicts the least-recently-touched entry.
/// Hits and inserts both refresh recency.
///

#[derive(Debug)]
pub struct TranslatorCache {
    entries: Mutex<LruCache<TranslationKey, CachedTranslator>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TranslatorCache {
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the cached translator for `key`, creating and inserting one
    /// with `create` on a miss. `create` runs inside the critical section and
    /// must only construct the translator, never compile it.
    pub fn get_or_insert_with(
        &self,
        key: TranslationKey,
        create: impl FnOnce() -> CachedTranslator,
    ) -> (CachedTranslator, CacheLookup) {
        let mut entries = self.entries.lock();

        if let Some(found) = entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return (found.clone(), CacheLookup::Hit);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key = ?key, "translator cache miss");

        let created = create();
        if let Some((evicted, _)) = entries.push(key, created.clone()) {
            debug!(key = ?evicted, "translator evicted");
        }

        (created, CacheLookup::Miss)
    }

    /// Look up without inserting; refreshes recency on a hit.
    #[must_use]
    pub fn get(&self, key: &TranslationKey) -> Option<CachedTranslator> {
        self.entries.lock().get(key).cloned()
    }

    /// Membership test that leaves recency untouched.
    #[must_use]
    pub fn contains(&self, key: &TranslationKey) -> bool {
        self.entries.lock().contains(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn capacity(&self) -> NonZeroUsize {
        self.entries.lock().cap()
    }

    // Cache statistics are best-effort only.
    #[must_use]
    pub fn stats(&self) -> TranslatorCacheStats {
        let entries = self.entries.lock();

        TranslatorCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: entries.len(),
            capacity: entries.cap().get(),
        }
    }
}
