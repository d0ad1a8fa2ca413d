//! Request deduplication cache
//!
//! Maps a source identity ([`CacheKey`]) to the fingerprint computed for it,
//! so repeated requests skip decoding and hashing entirely.
//!
//! The cache owns its synchronization: callers share it through cheap clones
//! and never lock anything themselves. Each operation is atomic on its own;
//! there are no multi-key transactions and `store` is last-writer-wins.
//!
//! By default the cache is unbounded and lives as long as the process. A
//! capacity can be configured, in which case least-recently-used entries are
//! evicted. Remote content changing behind a URL key is never detected.

pub mod in_flight;
pub mod key;

use lru::LruCache;
use serde::Serialize;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

pub use in_flight::InFlight;
pub use key::CacheKey;

use crate::config::CacheConfig;
use crate::fingerprint::FingerprintResult;

enum CacheStore {
    Unbounded(HashMap<CacheKey, FingerprintResult>),
    Bounded(LruCache<CacheKey, FingerprintResult>),
}

impl CacheStore {
    fn len(&self) -> usize {
        match self {
            Self::Unbounded(map) => map.len(),
            Self::Bounded(lru) => lru.len(),
        }
    }
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: Option<usize>,
    pub hits: u64,
    pub misses: u64,
}

/// Concurrent fingerprint cache
#[derive(Clone)]
pub struct FingerprintCache {
    store: Arc<RwLock<CacheStore>>,
    capacity: Option<NonZeroUsize>,
    in_flight: InFlight,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl FingerprintCache {
    /// Cache without any size limit
    pub fn unbounded() -> Self {
        Self::build(CacheStore::Unbounded(HashMap::new()), None)
    }

    /// Cache holding at most `capacity` entries, evicting the least recently used
    pub fn bounded(capacity: NonZeroUsize) -> Self {
        Self::build(CacheStore::Bounded(LruCache::new(capacity)), Some(capacity))
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        match config.max_entries.and_then(NonZeroUsize::new) {
            Some(capacity) => Self::bounded(capacity),
            None => Self::unbounded(),
        }
    }

    fn build(store: CacheStore, capacity: Option<NonZeroUsize>) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            capacity,
            in_flight: InFlight::new(),
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Look up a previously computed fingerprint
    pub async fn lookup(&self, key: &CacheKey) -> Option<FingerprintResult> {
        let found = if self.capacity.is_some() {
            // Recency bookkeeping needs exclusive access
            match &mut *self.store.write().await {
                CacheStore::Bounded(lru) => lru.get(key).cloned(),
                CacheStore::Unbounded(map) => map.get(key).cloned(),
            }
        } else {
            match &*self.store.read().await {
                CacheStore::Unbounded(map) => map.get(key).cloned(),
                CacheStore::Bounded(lru) => lru.peek(key).cloned(),
            }
        };

        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Store a fingerprint, replacing any previous value for the key
    pub async fn store(&self, key: CacheKey, result: FingerprintResult) {
        let mut store = self.store.write().await;
        match &mut *store {
            CacheStore::Unbounded(map) => {
                map.insert(key, result);
            }
            CacheStore::Bounded(lru) => {
                if let Some((evicted, _)) = lru.push(key.clone(), result)
                    && evicted != key
                {
                    debug!(cache_key = %evicted, "Evicted least recently used fingerprint");
                }
            }
        }
    }

    /// Pending-computation registry shared by every clone of this cache
    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len().await,
            capacity: self.capacity.map(NonZeroUsize::get),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for FingerprintCache {
    fn default() -> Self {
        Self::unbounded()
    }
}
