//! The station directory: cached listing, name resolution and additions.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::{NewStation, Station, StationId, ValidationError};
use crate::store::StationStore;

use super::cache::{StationCache, StationCacheConfig, StationList};
use super::error::StationError;
use super::resolve::{resolve_candidates, suggest};

/// Station directory backed by a store, with a cached station list.
pub struct StationDirectory<S> {
    store: Arc<S>,
    cache: StationCache,
}

impl<S> Clone for StationDirectory<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: self.cache.clone(),
        }
    }
}

impl<S: StationStore> StationDirectory<S> {
    /// Create a directory over the given store.
    pub fn new(store: Arc<S>, config: &StationCacheConfig) -> Self {
        Self {
            store,
            cache: StationCache::new(config),
        }
    }

    /// All stations ordered by name, from the cache when fresh.
    pub async fn list_stations(&self) -> Result<StationList, StationError> {
        if let Some(cached) = self.cache.get().await {
            return Ok(cached);
        }

        let generation = self.cache.generation().await;
        let stations = Arc::new(self.store.list_stations().await?);
        debug!(count = stations.len(), "loaded station list");
        if !self.cache.insert_if_current(Arc::clone(&stations), generation).await {
            debug!("station added during load, list not cached");
        }
        Ok(stations)
    }

    /// Ids of every station whose name contains `query`, ignoring case.
    pub async fn resolve_candidates(&self, query: &str) -> Result<HashSet<StationId>, StationError> {
        let stations = self.list_stations().await?;
        Ok(resolve_candidates(&stations, query))
    }

    /// Autocomplete suggestions for `query`, ordered by name.
    pub async fn suggest(&self, query: &str, limit: usize) -> Result<Vec<Station>, StationError> {
        let stations = self.list_stations().await?;
        Ok(suggest(&stations, query, limit))
    }

    /// Add a station.
    ///
    /// Both fields are trimmed; a blank location is stored as absent.
    pub async fn add_station(
        &self,
        name: &str,
        location: Option<&str>,
    ) -> Result<Station, StationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::new("Station name is required").into());
        }
        let location = location
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string);

        let station = self
            .store
            .insert_station(NewStation {
                name: name.to_string(),
                location,
            })
            .await?;
        self.cache.invalidate().await;

        info!(id = %station.id, name = %station.name, "added station");
        Ok(station)
    }
}

impl<S> std::fmt::Debug for StationDirectory<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StationDirectory")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreError};
    use tokio::sync::{Mutex, oneshot};

    /// Store that pauses its first station read after loading, until
    /// released.
    struct PausingStore {
        inner: MemoryStore,
        loaded: Mutex<Option<oneshot::Sender<()>>>,
        release: Mutex<Option<oneshot::Receiver<()>>>,
    }

    impl StationStore for PausingStore {
        async fn list_stations(&self) -> Result<Vec<Station>, StoreError> {
            let stations = self.inner.list_stations().await?;
            if let Some(loaded) = self.loaded.lock().await.take() {
                let _ = loaded.send(());
                if let Some(release) = self.release.lock().await.take() {
                    let _ = release.await;
                }
            }
            Ok(stations)
        }

        async fn insert_station(&self, station: NewStation) -> Result<Station, StoreError> {
            self.inner.insert_station(station).await
        }
    }

    fn directory() -> (Arc<MemoryStore>, StationDirectory<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let directory = StationDirectory::new(Arc::clone(&store), &StationCacheConfig::default());
        (store, directory)
    }

    #[tokio::test]
    async fn add_trims_and_drops_blank_location() {
        let (_, dir) = directory();
        let station = dir.add_station("  Kannur  ", Some("   ")).await.unwrap();
        assert_eq!(station.name, "Kannur");
        assert_eq!(station.location, None);

        let station = dir.add_station("Tirur", Some(" Malappuram ")).await.unwrap();
        assert_eq!(station.location.as_deref(), Some("Malappuram"));
    }

    #[tokio::test]
    async fn blank_name_is_validation_error() {
        let (store, dir) = directory();
        let err = dir.add_station("   ", None).await.unwrap_err();
        assert!(matches!(err, StationError::Validation(_)));
        assert_eq!(err.to_string(), "Station name is required");
        assert_eq!(store.counts().await.0, 0);
    }

    #[tokio::test]
    async fn adding_invalidates_cached_list() {
        let (_, dir) = directory();
        dir.add_station("Kozhikode", None).await.unwrap();
        assert_eq!(dir.list_stations().await.unwrap().len(), 1);

        dir.add_station("Kannur", None).await.unwrap();
        let names: Vec<String> = dir
            .list_stations()
            .await
            .unwrap()
            .iter()
            .map(|s| s.name.clone())
            .collect();
        assert_eq!(names, vec!["Kannur", "Kozhikode"]);
    }

    #[tokio::test]
    async fn station_added_during_load_is_not_hidden() {
        let (loaded_tx, loaded_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        let store = Arc::new(PausingStore {
            inner: MemoryStore::new(),
            loaded: Mutex::new(Some(loaded_tx)),
            release: Mutex::new(Some(release_rx)),
        });
        let dir = StationDirectory::new(store, &StationCacheConfig::default());

        let reader = tokio::spawn({
            let dir = dir.clone();
            async move { dir.list_stations().await.unwrap().len() }
        });

        // The reader has loaded the empty list but not yet cached it
        loaded_rx.await.unwrap();
        dir.add_station("Kannur", None).await.unwrap();
        release_tx.send(()).unwrap();
        assert_eq!(reader.await.unwrap(), 0);

        let names: Vec<String> = dir
            .list_stations()
            .await
            .unwrap()
            .iter()
            .map(|s| s.name.clone())
            .collect();
        assert_eq!(names, vec!["Kannur"]);
    }

    #[tokio::test]
    async fn list_served_from_cache() {
        let (store, dir) = directory();
        dir.add_station("Kozhikode", None).await.unwrap();
        dir.list_stations().await.unwrap();

        // Written behind the directory's back: not visible until the TTL expires
        store
            .insert_station(NewStation {
                name: "Manjeri".into(),
                location: None,
            })
            .await
            .unwrap();
        assert_eq!(dir.list_stations().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn resolves_duplicate_names() {
        let (_, dir) = directory();
        let a = dir.add_station("Kannur", None).await.unwrap();
        let b = dir.add_station("Kannur", Some("Old stand")).await.unwrap();
        dir.add_station("Kozhikode", None).await.unwrap();

        let ids = dir.resolve_candidates("KANNUR").await.unwrap();
        assert_eq!(ids, HashSet::from([a.id, b.id]));
    }
}
