//! Application state for the web layer.

use std::sync::Arc;

use crate::authoring::TripAuthor;
use crate::search::SearchConfig;
use crate::stations::{StationCacheConfig, StationDirectory};
use crate::store::Backend;

/// Shared application state.
///
/// Contains all the services needed to handle requests.
#[derive(Clone)]
pub struct AppState {
    /// Timetable store
    pub store: Arc<Backend>,

    /// Station directory with its cached station list
    pub stations: StationDirectory<Backend>,

    /// Trip writer, shared so writes are serialised across requests
    pub author: Arc<TripAuthor<Backend>>,

    /// Trip search configuration
    pub search: Arc<SearchConfig>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(store: Backend, search: SearchConfig, station_cache: &StationCacheConfig) -> Self {
        let store = Arc::new(store);
        Self {
            stations: StationDirectory::new(Arc::clone(&store), station_cache),
            author: Arc::new(TripAuthor::new(Arc::clone(&store))),
            search: Arc::new(search),
            store,
        }
    }
}
