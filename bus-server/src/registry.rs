//! Route listing and route detail pages.

use tracing::warn;

use crate::domain::{Route, RouteFilter, RouteId, TripSchedule};
use crate::store::{RouteStore, StoreError, TripStore};

/// Errors from loading a route's detail.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No route has this id
    #[error("route {0} not found")]
    NotFound(RouteId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A route with its trips.
#[derive(Debug, Clone)]
pub struct RouteDetail {
    pub route: Route,
    /// Trips in creation order, each with stops in travel order. Trips
    /// with inconsistent stop positions are left out.
    pub trips: Vec<TripSchedule>,
}

/// Routes matching the filter, newest first.
///
/// Store failures are logged and yield an empty list.
pub async fn list_routes<S: RouteStore>(store: &S, filter: &RouteFilter) -> Vec<Route> {
    match store.list_routes(filter).await {
        Ok(routes) => routes,
        Err(e) => {
            warn!(error = %e, ?filter, "failed to list routes");
            Vec::new()
        }
    }
}

/// A route and its trips.
pub async fn route_detail<S: RouteStore + TripStore>(
    store: &S,
    id: RouteId,
) -> Result<RouteDetail, RegistryError> {
    let (route, records) = futures::try_join!(store.get_route(id), store.list_trips_for_route(id))
        .map_err(|e| {
            if e.is_not_found() {
                RegistryError::NotFound(id)
            } else {
                RegistryError::Store(e)
            }
        })?;

    let trips = records
        .into_iter()
        .filter_map(TripSchedule::from_record_or_warn)
        .collect();

    Ok(RouteDetail { route, trips })
}
