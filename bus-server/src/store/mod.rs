//! Timetable storage.
//!
//! The relational store is an external service. These traits are the calls
//! the rest of the crate makes against it, so search and authoring can be
//! tested against [`MemoryStore`] and deployed against [`RestStore`].
//!
//! Lookups that expect at most one row return [`StoreError::NotFound`] for
//! "no row", distinct from genuine failures.

mod error;
mod memory;
mod rest;

pub use error::StoreError;
pub use memory::{MemoryStore, SeedData};
pub use rest::{RestStore, RestStoreConfig};

use crate::domain::{
    NewStation, NewStopTiming, NewTrip, Route, RouteFilter, RouteId, Station, StationId, Trip,
    TripId, TripRecord,
};

/// Station rows.
pub trait StationStore {
    /// All stations, ordered by name.
    async fn list_stations(&self) -> Result<Vec<Station>, StoreError>;

    async fn insert_station(&self, station: NewStation) -> Result<Station, StoreError>;
}

/// Route rows.
pub trait RouteStore {
    /// Exact-text lookup on the (from, to) pair.
    async fn find_route_by_pair(&self, from: &str, to: &str) -> Result<Route, StoreError>;

    async fn insert_route(&self, from: &str, to: &str) -> Result<Route, StoreError>;

    async fn get_route(&self, id: RouteId) -> Result<Route, StoreError>;

    /// Routes matching the filter, newest first.
    async fn list_routes(&self, filter: &RouteFilter) -> Result<Vec<Route>, StoreError>;

    /// Remove a route. Only used to undo a failed trip creation.
    async fn delete_route(&self, id: RouteId) -> Result<(), StoreError>;
}

/// Trip and stop timing rows.
///
/// Returned records carry their stops in backend order; callers sort them.
pub trait TripStore {
    /// Trips of a route, oldest first.
    async fn list_trips_for_route(&self, route: RouteId) -> Result<Vec<TripRecord>, StoreError>;

    /// Every trip with a stop at any of `stations`, with its full stop list.
    async fn list_trips_calling_at(
        &self,
        stations: &[StationId],
    ) -> Result<Vec<TripRecord>, StoreError>;

    async fn insert_trip(&self, trip: NewTrip) -> Result<Trip, StoreError>;

    /// Remove a trip and its timings. Only used to undo a failed creation.
    async fn delete_trip(&self, id: TripId) -> Result<(), StoreError>;

    /// Insert all timings of a trip as one batch.
    async fn insert_timings(&self, timings: Vec<NewStopTiming>) -> Result<(), StoreError>;
}

/// The store selected at start-up.
#[derive(Debug, Clone)]
pub enum Backend {
    Memory(MemoryStore),
    Rest(RestStore),
}

impl Backend {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Backend::Memory(_) => "memory",
            Backend::Rest(_) => "rest",
        }
    }
}

impl StationStore for Backend {
    async fn list_stations(&self) -> Result<Vec<Station>, StoreError> {
        match self {
            Backend::Memory(s) => s.list_stations().await,
            Backend::Rest(s) => s.list_stations().await,
        }
    }

    async fn insert_station(&self, station: NewStation) -> Result<Station, StoreError> {
        match self {
            Backend::Memory(s) => s.insert_station(station).await,
            Backend::Rest(s) => s.insert_station(station).await,
        }
    }
}

impl RouteStore for Backend {
    async fn find_route_by_pair(&self, from: &str, to: &str) -> Result<Route, StoreError> {
        match self {
            Backend::Memory(s) => s.find_route_by_pair(from, to).await,
            Backend::Rest(s) => s.find_route_by_pair(from, to).await,
        }
    }

    async fn insert_route(&self, from: &str, to: &str) -> Result<Route, StoreError> {
        match self {
            Backend::Memory(s) => s.insert_route(from, to).await,
            Backend::Rest(s) => s.insert_route(from, to).await,
        }
    }

    async fn get_route(&self, id: RouteId) -> Result<Route, StoreError> {
        match self {
            Backend::Memory(s) => s.get_route(id).await,
            Backend::Rest(s) => s.get_route(id).await,
        }
    }

    async fn list_routes(&self, filter: &RouteFilter) -> Result<Vec<Route>, StoreError> {
        match self {
            Backend::Memory(s) => s.list_routes(filter).await,
            Backend::Rest(s) => s.list_routes(filter).await,
        }
    }

    async fn delete_route(&self, id: RouteId) -> Result<(), StoreError> {
        match self {
            Backend::Memory(s) => s.delete_route(id).await,
            Backend::Rest(s) => s.delete_route(id).await,
        }
    }
}

impl TripStore for Backend {
    async fn list_trips_for_route(&self, route: RouteId) -> Result<Vec<TripRecord>, StoreError> {
        match self {
            Backend::Memory(s) => s.list_trips_for_route(route).await,
            Backend::Rest(s) => s.list_trips_for_route(route).await,
        }
    }

    async fn list_trips_calling_at(
        &self,
        stations: &[StationId],
    ) -> Result<Vec<TripRecord>, StoreError> {
        match self {
            Backend::Memory(s) => s.list_trips_calling_at(stations).await,
            Backend::Rest(s) => s.list_trips_calling_at(stations).await,
        }
    }

    async fn insert_trip(&self, trip: NewTrip) -> Result<Trip, StoreError> {
        match self {
            Backend::Memory(s) => s.insert_trip(trip).await,
            Backend::Rest(s) => s.insert_trip(trip).await,
        }
    }

    async fn delete_trip(&self, id: TripId) -> Result<(), StoreError> {
        match self {
            Backend::Memory(s) => s.delete_trip(id).await,
            Backend::Rest(s) => s.delete_trip(id).await,
        }
    }

    async fn insert_timings(&self, timings: Vec<NewStopTiming>) -> Result<(), StoreError> {
        match self {
            Backend::Memory(s) => s.insert_timings(timings).await,
            Backend::Rest(s) => s.insert_timings(timings).await,
        }
    }
}
