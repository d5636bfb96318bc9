//! Bounded, expiring cache of built retrieval indices.

use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::vector_store::MemoryVectorStore;

/// Point-in-time cache counters.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub ttl_seconds: Option<u64>,
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped for capacity or expiry.
    pub evictions: u64,
}

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// LRU cache keyed by content hash, with optional time-to-live.
///
/// Expired entries are dropped lazily when looked up or when they reach
/// the cold end of the LRU.
pub struct IndexCache<V = Arc<MemoryVectorStore>> {
    entries: Mutex<LruCache<String, Entry<V>>>,
    capacity: NonZeroUsize,
    ttl: Option<Duration>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<V: Clone> IndexCache<V> {
    /// A capacity of zero is treated as one.
    pub fn new(max_entries: usize, ttl: Option<Duration>) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            capacity,
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    fn is_expired(&self, entry: &Entry<V>) -> bool {
        self.ttl
            .is_some_and(|ttl| entry.inserted_at.elapsed() >= ttl)
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        let expired = match entries.get(key) {
            Some(entry) if !self.is_expired(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.pop(key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
            debug!("Index {} expired", key);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn insert(&self, key: String, value: V) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        // Prefer dropping stale entries over live ones.
        while let Some((_, oldest)) = entries.peek_lru() {
            if !self.is_expired(oldest) {
                break;
            }
            entries.pop_lru();
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }

        let entry = Entry {
            value,
            inserted_at: Instant::now(),
        };
        if let Some((evicted, _)) = entries.push(key.clone(), entry) {
            if evicted != key {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!("Evicted index {} for capacity", evicted);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            capacity: self.capacity.get(),
            ttl_seconds: self.ttl.map(|t| t.as_secs()),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}
