//! In-memory cache of the station list.
//!
//! Search resolves both queries against the full station list, so every
//! search would otherwise re-read the whole table. The list is small and
//! changes only when a station is added, which invalidates the cache.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;
use tokio::sync::RwLock;

use crate::domain::Station;

/// Default time a cached list stays fresh.
const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Cached station list, ordered by name.
pub type StationList = Arc<Vec<Station>>;

/// Configuration for the station cache.
#[derive(Debug, Clone)]
pub struct StationCacheConfig {
    /// How long a cached list remains valid.
    pub ttl: Duration,
}

impl StationCacheConfig {
    /// Create a config with the given TTL.
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }
}

impl Default for StationCacheConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

/// Single-entry TTL cache holding the station list.
///
/// Every invalidation bumps a generation counter. A list loaded before an
/// invalidation is never stored after it.
#[derive(Clone)]
pub struct StationCache {
    entries: MokaCache<(), StationList>,
    generation: Arc<RwLock<u64>>,
}

impl StationCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &StationCacheConfig) -> Self {
        let entries = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(1)
            .build();

        Self {
            entries,
            generation: Arc::new(RwLock::new(0)),
        }
    }

    /// The cached list, if present and fresh.
    pub async fn get(&self) -> Option<StationList> {
        self.entries.get(&()).await
    }

    /// Current generation. Read it before loading the list from the store.
    pub async fn generation(&self) -> u64 {
        *self.generation.read().await
    }

    /// Replace the cached list, unless the cache was invalidated since
    /// `generation` was read. Returns whether the list was stored.
    pub async fn insert_if_current(&self, stations: StationList, generation: u64) -> bool {
        let current = self.generation.read().await;
        if *current != generation {
            return false;
        }
        self.entries.insert((), stations).await;
        true
    }

    /// Drop the cached list so the next read goes to the store.
    pub async fn invalidate(&self) {
        let mut generation = self.generation.write().await;
        *generation += 1;
        self.entries.invalidate(&()).await;
    }
}

impl std::fmt::Debug for StationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StationCache")
            .field("entries", &self.entries.entry_count())
            .field("generation", &self.generation.try_read().map(|g| *g).ok())
            .finish()
    }
}
