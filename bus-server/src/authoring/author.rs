//! Writing new trips.
//!
//! A trip is written as route, then trip row, then its timings. The
//! backend offers no transactions, so a failed step deletes what this
//! call already wrote.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::domain::{NewStopTiming, NewTrip, Route, RouteId, Trip, TripId, ValidationError};
use crate::store::{RouteStore, StoreError, TripStore};

use super::draft::TripDraft;
use super::validate::{ValidatedTrip, validate};

/// Errors from trip authoring.
#[derive(Debug, thiserror::Error)]
pub enum AuthoringError {
    /// The draft was rejected before any write
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A write failed and everything written so far was removed
    #[error("failed to save trip: {0}")]
    Store(#[from] StoreError),

    /// A write failed and removing the rows already written also failed
    #[error("failed to save trip ({cause}); left behind: {left_behind}")]
    PartialWrite {
        cause: StoreError,
        left_behind: String,
    },
}

/// A trip that was written.
#[derive(Debug, Clone)]
pub struct CreatedTrip {
    pub trip: Trip,
    pub route: Route,
    /// Whether the route was created by this call.
    pub route_created: bool,
}

/// Writes trips and their routes.
///
/// Writers are serialised, so two submissions for the same new route
/// cannot both create it.
pub struct TripAuthor<S> {
    store: Arc<S>,
    writer: Mutex<()>,
}

impl<S: RouteStore + TripStore> TripAuthor<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            writer: Mutex::new(()),
        }
    }

    /// The route with exactly these labels, created if missing.
    pub async fn ensure_route(&self, from: &str, to: &str) -> Result<Route, StoreError> {
        let _guard = self.writer.lock().await;
        self.upsert_route(from, to).await.map(|(route, _)| route)
    }

    /// Look up the route, creating it on a miss. Returns whether it was
    /// created here.
    async fn upsert_route(&self, from: &str, to: &str) -> Result<(Route, bool), StoreError> {
        match self.store.find_route_by_pair(from, to).await {
            Ok(route) => return Ok((route, false)),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        match self.store.insert_route(from, to).await {
            Ok(route) => {
                info!(id = %route.id, route = %route.title(), "created route");
                Ok((route, true))
            }
            // Another writer got there first
            Err(StoreError::Conflict { .. }) => {
                let route = self.store.find_route_by_pair(from, to).await?;
                Ok((route, false))
            }
            Err(e) => Err(e),
        }
    }

    /// Validate a draft and write it as a new trip.
    pub async fn create_trip(&self, draft: &TripDraft) -> Result<CreatedTrip, AuthoringError> {
        let validated = validate(draft)?;
        self.write_trip(validated).await
    }

    async fn write_trip(&self, validated: ValidatedTrip) -> Result<CreatedTrip, AuthoringError> {
        let _guard = self.writer.lock().await;

        let ValidatedTrip {
            from_location,
            to_location,
            info,
            stops,
        } = validated;

        let (route, route_created) = self.upsert_route(&from_location, &to_location).await?;
        let new_route = route_created.then_some(route.id);

        let trip = match self
            .store
            .insert_trip(NewTrip {
                route_id: route.id,
                info,
            })
            .await
        {
            Ok(trip) => trip,
            Err(e) => return Err(self.roll_back(None, new_route, e).await),
        };

        let timings = stops
            .into_iter()
            .map(|stop| NewStopTiming {
                trip_id: trip.id,
                station_id: stop.station_id,
                arrival: stop.arrival,
                departure: Some(stop.departure),
                stop_duration: stop.stop_duration,
                sequence: stop.sequence,
            })
            .collect::<Vec<_>>();
        let stop_count = timings.len();

        if let Err(e) = self.store.insert_timings(timings).await {
            return Err(self.roll_back(Some(trip.id), new_route, e).await);
        }

        info!(
            trip = %trip.id,
            route = %route.id,
            stops = stop_count,
            "created trip"
        );
        Ok(CreatedTrip {
            trip,
            route,
            route_created,
        })
    }

    /// Delete rows written before `cause` failed the creation.
    async fn roll_back(
        &self,
        trip: Option<TripId>,
        route: Option<RouteId>,
        cause: StoreError,
    ) -> AuthoringError {
        warn!(error = %cause, ?trip, ?route, "trip creation failed, rolling back");
        let mut left_behind = Vec::new();

        if let Some(id) = trip
            && let Err(e) = self.store.delete_trip(id).await
        {
            error!(trip = %id, error = %e, "failed to delete trip during rollback");
            left_behind.push(format!("trip {id}"));
        }

        if let Some(id) = route {
            // A route still holding the trip cannot be deleted
            if !left_behind.is_empty() {
                left_behind.push(format!("route {id}"));
            } else if let Err(e) = self.store.delete_route(id).await {
                error!(route = %id, error = %e, "failed to delete route during rollback");
                left_behind.push(format!("route {id}"));
            }
        }

        if left_behind.is_empty() {
            AuthoringError::Store(cause)
        } else {
            AuthoringError::PartialWrite {
                cause,
                left_behind: left_behind.join(", "),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authoring::draft::{DraftCommand, StopField};
    use crate::domain::{NewStation, RouteFilter, StationId, TripRecord};
    use crate::store::{MemoryStore, StationStore};
    use std::sync::atomic::{AtomicBool, Ordering};

    async fn stations(store: &MemoryStore, names: &[&str]) -> Vec<StationId> {
        let mut ids = Vec::new();
        for name in names {
            let station = store
                .insert_station(NewStation {
                    name: name.to_string(),
                    location: None,
                })
                .await
                .unwrap();
            ids.push(station.id);
        }
        ids
    }

    fn draft(from: &str, to: &str, stops: &[(StationId, &str)]) -> TripDraft {
        let mut draft = TripDraft::with_stops(Vec::new());
        for (i, (station, departure)) in stops.iter().enumerate() {
            draft = draft
                .apply(DraftCommand::AddStop)
                .apply(DraftCommand::UpdateStopField(i, StopField::Station(station.to_string())))
                .apply(DraftCommand::UpdateStopField(i, StopField::Departure(departure.to_string())));
        }
        draft.from_location = from.to_string();
        draft.to_location = to.to_string();
        draft.bus_name = "Night Rider".to_string();
        draft
    }

    #[tokio::test]
    async fn single_stop_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let ids = stations(&store, &["Kannur"]).await;
        let author = TripAuthor::new(Arc::clone(&store));

        let err = author
            .create_trip(&draft("Kannur", "Kannur", &[(ids[0], "22:00")]))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthoringError::Validation(_)));
        assert_eq!(err.to_string(), "At least 2 stations are required");
        assert_eq!(store.counts().await, (1, 0, 0, 0));
    }

    #[tokio::test]
    async fn creates_route_trip_and_timings() {
        let store = Arc::new(MemoryStore::new());
        let ids = stations(&store, &["Kannur", "Kozhikode", "Malappuram"]).await;
        let author = TripAuthor::new(Arc::clone(&store));

        let created = author
            .create_trip(&draft(
                " Kannur ",
                "Malappuram",
                &[(ids[0], "22:00"), (ids[1], "23:05"), (ids[2], "01:00")],
            ))
            .await
            .unwrap();

        assert!(created.route_created);
        assert_eq!(created.route.from_location, "Kannur");

        let records: Vec<TripRecord> = store.list_trips_for_route(created.route.id).await.unwrap();
        assert_eq!(records.len(), 1);
        let seqs: Vec<u32> = records[0].stops.iter().map(|s| s.sequence()).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert_eq!(records[0].stops[2].station.name, "Malappuram");
    }

    #[tokio::test]
    async fn second_trip_reuses_route() {
        let store = Arc::new(MemoryStore::new());
        let ids = stations(&store, &["Kannur", "Tirur"]).await;
        let author = TripAuthor::new(Arc::clone(&store));
        let stops = [(ids[0], "06:00"), (ids[1], "09:00")];

        let first = author.create_trip(&draft("Kannur", "Tirur", &stops)).await.unwrap();
        let second = author.create_trip(&draft("Kannur ", " Tirur", &stops)).await.unwrap();

        assert_eq!(first.route.id, second.route.id);
        assert!(!second.route_created);
        assert_eq!(store.counts().await, (2, 1, 2, 4));
    }

    #[tokio::test]
    async fn sequential_ensure_route_never_duplicates() {
        let store = Arc::new(MemoryStore::new());
        let author = TripAuthor::new(Arc::clone(&store));

        let a = author.ensure_route("Kochi", "Kozhikode").await.unwrap();
        let b = author.ensure_route("Kochi", "Kozhikode").await.unwrap();
        assert_eq!(a.id, b.id);

        // Casing variants are different routes
        let c = author.ensure_route("kochi", "Kozhikode").await.unwrap();
        assert_ne!(a.id, c.id);

        let routes = store.list_routes(&RouteFilter::default()).await.unwrap();
        assert_eq!(routes.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_ensure_route_creates_one() {
        let store = Arc::new(MemoryStore::new());
        let author = TripAuthor::new(Arc::clone(&store));

        let results =
            futures::future::join_all((0..8).map(|_| author.ensure_route("Thrissur", "Kochi")))
                .await;

        let ids: Vec<RouteId> = results.into_iter().map(|r| r.unwrap().id).collect();
        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_eq!(store.counts().await.1, 1);
    }

    #[tokio::test]
    async fn conflict_on_insert_rereads_winner() {
        let store = Arc::new(RacingStore::new());
        let author = TripAuthor::new(Arc::clone(&store));

        let route = author.ensure_route("Palakkad", "Kozhikode").await.unwrap();
        let winner = store.inner.find_route_by_pair("Palakkad", "Kozhikode").await.unwrap();
        assert_eq!(route.id, winner.id);
    }

    #[tokio::test]
    async fn failed_timings_roll_back_trip_and_new_route() {
        let store = Arc::new(FaultyStore::new());
        let ids = stations(&store.inner, &["Kannur", "Tirur"]).await;
        store.fail_timings.store(true, Ordering::SeqCst);
        let author = TripAuthor::new(Arc::clone(&store));

        let err = author
            .create_trip(&draft("Kannur", "Tirur", &[(ids[0], "06:00"), (ids[1], "09:00")]))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthoringError::Store(_)));
        assert_eq!(store.inner.counts().await, (2, 0, 0, 0));
    }

    #[tokio::test]
    async fn rollback_keeps_existing_route() {
        let store = Arc::new(FaultyStore::new());
        let ids = stations(&store.inner, &["Kannur", "Tirur"]).await;
        let existing = store.inner.insert_route("Kannur", "Tirur").await.unwrap();
        store.fail_timings.store(true, Ordering::SeqCst);
        let author = TripAuthor::new(Arc::clone(&store));

        author
            .create_trip(&draft("Kannur", "Tirur", &[(ids[0], "06:00"), (ids[1], "09:00")]))
            .await
            .unwrap_err();

        assert_eq!(store.inner.counts().await, (2, 1, 0, 0));
        assert!(store.inner.get_route(existing.id).await.is_ok());
    }

    #[tokio::test]
    async fn failed_rollback_is_partial_write() {
        let store = Arc::new(FaultyStore::new());
        let ids = stations(&store.inner, &["Kannur", "Tirur"]).await;
        store.fail_timings.store(true, Ordering::SeqCst);
        store.fail_deletes.store(true, Ordering::SeqCst);
        let author = TripAuthor::new(Arc::clone(&store));

        let err = author
            .create_trip(&draft("Kannur", "Tirur", &[(ids[0], "06:00"), (ids[1], "09:00")]))
            .await
            .unwrap_err();

        match err {
            AuthoringError::PartialWrite { left_behind, .. } => {
                assert!(left_behind.starts_with("trip "));
                assert!(left_behind.contains("route "));
            }
            other => panic!("expected partial write, got {other:?}"),
        }
        assert_eq!(store.inner.counts().await, (2, 1, 1, 0));
    }

    fn injected() -> StoreError {
        StoreError::Api {
            status: 500,
            message: "injected failure".to_string(),
        }
    }

    /// Memory store with switchable write failures.
    struct FaultyStore {
        inner: MemoryStore,
        fail_timings: AtomicBool,
        fail_deletes: AtomicBool,
    }

    impl FaultyStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                fail_timings: AtomicBool::new(false),
                fail_deletes: AtomicBool::new(false),
            }
        }
    }

    impl RouteStore for FaultyStore {
        async fn find_route_by_pair(&self, from: &str, to: &str) -> Result<Route, StoreError> {
            self.inner.find_route_by_pair(from, to).await
        }

        async fn insert_route(&self, from: &str, to: &str) -> Result<Route, StoreError> {
            self.inner.insert_route(from, to).await
        }

        async fn get_route(&self, id: RouteId) -> Result<Route, StoreError> {
            self.inner.get_route(id).await
        }

        async fn list_routes(&self, filter: &RouteFilter) -> Result<Vec<Route>, StoreError> {
            self.inner.list_routes(filter).await
        }

        async fn delete_route(&self, id: RouteId) -> Result<(), StoreError> {
            if self.fail_deletes.load(Ordering::SeqCst) {
                return Err(injected());
            }
            self.inner.delete_route(id).await
        }
    }

    impl TripStore for FaultyStore {
        async fn list_trips_for_route(&self, route: RouteId) -> Result<Vec<TripRecord>, StoreError> {
            self.inner.list_trips_for_route(route).await
        }

        async fn list_trips_calling_at(
            &self,
            stations: &[StationId],
        ) -> Result<Vec<TripRecord>, StoreError> {
            self.inner.list_trips_calling_at(stations).await
        }

        async fn insert_trip(&self, trip: NewTrip) -> Result<Trip, StoreError> {
            self.inner.insert_trip(trip).await
        }

        async fn delete_trip(&self, id: TripId) -> Result<(), StoreError> {
            if self.fail_deletes.load(Ordering::SeqCst) {
                return Err(injected());
            }
            self.inner.delete_trip(id).await
        }

        async fn insert_timings(&self, timings: Vec<NewStopTiming>) -> Result<(), StoreError> {
            if self.fail_timings.load(Ordering::SeqCst) {
                return Err(injected());
            }
            self.inner.insert_timings(timings).await
        }
    }

    /// Store where another writer creates the route between lookup and
    /// insert.
    struct RacingStore {
        inner: MemoryStore,
    }

    impl RacingStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
            }
        }
    }

    impl RouteStore for RacingStore {
        async fn find_route_by_pair(&self, from: &str, to: &str) -> Result<Route, StoreError> {
            self.inner.find_route_by_pair(from, to).await
        }

        async fn insert_route(&self, from: &str, to: &str) -> Result<Route, StoreError> {
            // The rival's insert lands first
            self.inner.insert_route(from, to).await?;
            self.inner.insert_route(from, to).await
        }

        async fn get_route(&self, id: RouteId) -> Result<Route, StoreError> {
            self.inner.get_route(id).await
        }

        async fn list_routes(&self, filter: &RouteFilter) -> Result<Vec<Route>, StoreError> {
            self.inner.list_routes(filter).await
        }

        async fn delete_route(&self, id: RouteId) -> Result<(), StoreError> {
            self.inner.delete_route(id).await
        }
    }

    impl TripStore for RacingStore {
        async fn list_trips_for_route(&self, route: RouteId) -> Result<Vec<TripRecord>, StoreError> {
            self.inner.list_trips_for_route(route).await
        }

        async fn list_trips_calling_at(
            &self,
            stations: &[StationId],
        ) -> Result<Vec<TripRecord>, StoreError> {
            self.inner.list_trips_calling_at(stations).await
        }

        async fn insert_trip(&self, trip: NewTrip) -> Result<Trip, StoreError> {
            self.inner.insert_trip(trip).await
        }

        async fn delete_trip(&self, id: TripId) -> Result<(), StoreError> {
            self.inner.delete_trip(id).await
        }

        async fn insert_timings(&self, timings: Vec<NewStopTiming>) -> Result<(), StoreError> {
            self.inner.insert_timings(timings).await
        }
    }
}
