//! In-process store for development and tests.
//!
//! Optionally seeded from a JSON file, so the site can be run locally
//! without database credentials. Enforces the constraints the hosted
//! schema has: foreign keys, unique `(trip, sequence)` positions and a
//! unique index on the route `(from, to)` pair.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::domain::{
    NewStation, NewStopTiming, NewTrip, Route, RouteFilter, RouteId, ScheduledStop, Station,
    StationId, StopTiming, StopTimingId, Trip, TripId, TripRecord,
};

use super::error::StoreError;
use super::{RouteStore, StationStore, TripStore};

/// Contents of a seed file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub stations: Vec<Station>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub trips: Vec<Trip>,
    #[serde(default)]
    pub timings: Vec<StopTiming>,
}

#[derive(Debug, Default)]
struct Tables {
    stations: Vec<Station>,
    routes: Vec<Route>,
    trips: Vec<Trip>,
    timings: Vec<StopTiming>,
    next_id: i64,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.iter().find(|s| s.id == id)
    }

    fn record(&self, trip: &Trip) -> TripRecord {
        let stops = self
            .timings
            .iter()
            .filter(|t| t.trip_id == trip.id)
            .filter_map(|t| {
                self.station(t.station_id).map(|station| ScheduledStop {
                    timing: t.clone(),
                    station: station.clone(),
                })
            })
            .collect();

        TripRecord {
            trip: trip.clone(),
            route: self.routes.iter().find(|r| r.id == trip.route_id).cloned(),
            stops,
        }
    }

    /// Check the references and uniqueness rules of the seed data.
    fn check(&self) -> Result<(), StoreError> {
        let seed_err = |message: String| StoreError::Seed { message };

        for trip in &self.trips {
            if !self.routes.iter().any(|r| r.id == trip.route_id) {
                return Err(seed_err(format!(
                    "trip {} references missing route {}",
                    trip.id, trip.route_id
                )));
            }
        }

        let mut positions = HashSet::new();
        for timing in &self.timings {
            if !self.trips.iter().any(|t| t.id == timing.trip_id) {
                return Err(seed_err(format!(
                    "timing {} references missing trip {}",
                    timing.id, timing.trip_id
                )));
            }
            if self.station(timing.station_id).is_none() {
                return Err(seed_err(format!(
                    "timing {} references missing station {}",
                    timing.id, timing.station_id
                )));
            }
            if !positions.insert((timing.trip_id, timing.sequence)) {
                return Err(seed_err(format!(
                    "trip {} has two stops at position {}",
                    timing.trip_id, timing.sequence
                )));
            }
        }

        let mut pairs = HashSet::new();
        for route in &self.routes {
            if !pairs.insert((route.from_location.as_str(), route.to_location.as_str())) {
                return Err(seed_err(format!("duplicate route {}", route.title())));
            }
        }

        Ok(())
    }
}

/// In-memory timetable store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given rows.
    ///
    /// Fails if the rows reference each other inconsistently.
    pub fn from_seed(seed: SeedData) -> Result<Self, StoreError> {
        let max_id = seed
            .stations
            .iter()
            .map(|s| s.id.0)
            .chain(seed.routes.iter().map(|r| r.id.0))
            .chain(seed.trips.iter().map(|t| t.id.0))
            .chain(seed.timings.iter().map(|t| t.id.0))
            .max()
            .unwrap_or(0);

        let tables = Tables {
            stations: seed.stations,
            routes: seed.routes,
            trips: seed.trips,
            timings: seed.timings,
            next_id: max_id,
        };
        tables.check()?;

        Ok(Self {
            tables: Arc::new(RwLock::new(tables)),
        })
    }

    /// Load a seed file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| StoreError::Seed {
            message: format!("failed to read {}: {e}", path.display()),
        })?;

        let seed: SeedData = serde_json::from_str(&json).map_err(|e| StoreError::Json {
            message: format!("failed to parse {}: {e}", path.display()),
        })?;

        Self::from_seed(seed)
    }

    /// Row counts as (stations, routes, trips, timings).
    pub async fn counts(&self) -> (usize, usize, usize, usize) {
        let tables = self.tables.read().await;
        (
            tables.stations.len(),
            tables.routes.len(),
            tables.trips.len(),
            tables.timings.len(),
        )
    }
}

impl StationStore for MemoryStore {
    async fn list_stations(&self) -> Result<Vec<Station>, StoreError> {
        let tables = self.tables.read().await;
        let mut stations = tables.stations.clone();
        stations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(stations)
    }

    async fn insert_station(&self, station: NewStation) -> Result<Station, StoreError> {
        if station.name.trim().is_empty() {
            return Err(StoreError::Constraint {
                table: "bus_stations",
                message: "station_name must not be empty".to_string(),
            });
        }

        let mut tables = self.tables.write().await;
        let row = Station {
            id: StationId(tables.allocate_id()),
            name: station.name,
            location: station.location,
            created_at: Some(Utc::now()),
        };
        tables.stations.push(row.clone());
        Ok(row)
    }
}

impl RouteStore for MemoryStore {
    async fn find_route_by_pair(&self, from: &str, to: &str) -> Result<Route, StoreError> {
        let tables = self.tables.read().await;
        tables
            .routes
            .iter()
            .find(|r| r.has_pair(from, to))
            .cloned()
            .ok_or(StoreError::NotFound { table: "routes" })
    }

    async fn insert_route(&self, from: &str, to: &str) -> Result<Route, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.routes.iter().any(|r| r.has_pair(from, to)) {
            return Err(StoreError::Conflict {
                table: "routes",
                message: format!("{from} → {to} already exists"),
            });
        }

        let row = Route {
            id: RouteId(tables.allocate_id()),
            from_location: from.to_string(),
            to_location: to.to_string(),
            created_at: Some(Utc::now()),
        };
        tables.routes.push(row.clone());
        Ok(row)
    }

    async fn get_route(&self, id: RouteId) -> Result<Route, StoreError> {
        let tables = self.tables.read().await;
        tables
            .routes
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StoreError::NotFound { table: "routes" })
    }

    async fn list_routes(&self, filter: &RouteFilter) -> Result<Vec<Route>, StoreError> {
        let tables = self.tables.read().await;
        // Insertion order is creation order; newest first.
        Ok(tables
            .routes
            .iter()
            .rev()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn delete_route(&self, id: RouteId) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.trips.iter().any(|t| t.route_id == id) {
            return Err(StoreError::Constraint {
                table: "routes",
                message: format!("route {id} still has trips"),
            });
        }
        let before = tables.routes.len();
        tables.routes.retain(|r| r.id != id);
        if tables.routes.len() == before {
            return Err(StoreError::NotFound { table: "routes" });
        }
        Ok(())
    }
}

impl TripStore for MemoryStore {
    async fn list_trips_for_route(&self, route: RouteId) -> Result<Vec<TripRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .trips
            .iter()
            .filter(|t| t.route_id == route)
            .map(|t| tables.record(t))
            .collect())
    }

    async fn list_trips_calling_at(
        &self,
        stations: &[StationId],
    ) -> Result<Vec<TripRecord>, StoreError> {
        let tables = self.tables.read().await;
        let calling: HashSet<TripId> = tables
            .timings
            .iter()
            .filter(|t| stations.contains(&t.station_id))
            .map(|t| t.trip_id)
            .collect();

        Ok(tables
            .trips
            .iter()
            .filter(|t| calling.contains(&t.id))
            .map(|t| tables.record(t))
            .collect())
    }

    async fn insert_trip(&self, trip: NewTrip) -> Result<Trip, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.routes.iter().any(|r| r.id == trip.route_id) {
            return Err(StoreError::Constraint {
                table: "buses",
                message: format!("route {} does not exist", trip.route_id),
            });
        }

        let row = Trip {
            id: TripId(tables.allocate_id()),
            route_id: trip.route_id,
            info: trip.info,
            created_at: Some(Utc::now()),
        };
        tables.trips.push(row.clone());
        Ok(row)
    }

    async fn delete_trip(&self, id: TripId) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.trips.len();
        tables.trips.retain(|t| t.id != id);
        if tables.trips.len() == before {
            return Err(StoreError::NotFound { table: "buses" });
        }
        tables.timings.retain(|t| t.trip_id != id);
        Ok(())
    }

    async fn insert_timings(&self, timings: Vec<NewStopTiming>) -> Result<(), StoreError> {
        let constraint = |message: String| StoreError::Constraint {
            table: "trip_timings",
            message,
        };

        let mut tables = self.tables.write().await;

        // Validate the whole batch first so a rejected batch writes nothing.
        let mut positions: HashSet<(TripId, u32)> = tables
            .timings
            .iter()
            .map(|t| (t.trip_id, t.sequence))
            .collect();
        for timing in &timings {
            if !tables.trips.iter().any(|t| t.id == timing.trip_id) {
                return Err(constraint(format!("trip {} does not exist", timing.trip_id)));
            }
            if tables.station(timing.station_id).is_none() {
                return Err(constraint(format!(
                    "station {} does not exist",
                    timing.station_id
                )));
            }
            if !positions.insert((timing.trip_id, timing.sequence)) {
                return Err(StoreError::Conflict {
                    table: "trip_timings",
                    message: format!(
                        "trip {} already has a stop at position {}",
                        timing.trip_id, timing.sequence
                    ),
                });
            }
        }

        for timing in timings {
            let row = StopTiming {
                id: StopTimingId(tables.allocate_id()),
                trip_id: timing.trip_id,
                station_id: timing.station_id,
                arrival: timing.arrival,
                departure: timing.departure,
                stop_duration: timing.stop_duration,
                sequence: timing.sequence,
            };
            tables.timings.push(row);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{StopDuration, TimeOfDay, TripInfo};

    async fn station(store: &MemoryStore, name: &str) -> Station {
        store
            .insert_station(NewStation {
                name: name.to_string(),
                location: None,
            })
            .await
            .unwrap()
    }

    fn timing(trip: TripId, station: StationId, seq: u32) -> NewStopTiming {
        NewStopTiming {
            trip_id: trip,
            station_id: station,
            arrival: None,
            departure: TimeOfDay::from_hm(8, seq),
            stop_duration: StopDuration::default(),
            sequence: seq,
        }
    }

    #[tokio::test]
    async fn stations_listed_by_name() {
        let store = MemoryStore::new();
        station(&store, "Manjeri").await;
        station(&store, "Kannur").await;

        let names: Vec<String> = store
            .list_stations()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Kannur", "Manjeri"]);
    }

    #[tokio::test]
    async fn blank_station_name_rejected() {
        let store = MemoryStore::new();
        let result = store
            .insert_station(NewStation {
                name: "  ".into(),
                location: None,
            })
            .await;
        assert!(matches!(result, Err(StoreError::Constraint { .. })));
    }

    #[tokio::test]
    async fn route_lookup_distinguishes_not_found() {
        let store = MemoryStore::new();
        let err = store.find_route_by_pair("Kochi", "Kozhikode").await.unwrap_err();
        assert!(err.is_not_found());

        let route = store.insert_route("Kochi", "Kozhikode").await.unwrap();
        let found = store.find_route_by_pair("Kochi", "Kozhikode").await.unwrap();
        assert_eq!(found.id, route.id);
    }

    #[tokio::test]
    async fn route_pair_is_unique() {
        let store = MemoryStore::new();
        store.insert_route("Kochi", "Kozhikode").await.unwrap();
        let err = store.insert_route("Kochi", "Kozhikode").await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        // Different casing is a different route
        assert!(store.insert_route("kochi", "Kozhikode").await.is_ok());
    }

    #[tokio::test]
    async fn routes_listed_newest_first_with_filter() {
        let store = MemoryStore::new();
        store.insert_route("Kozhikode", "Kannur").await.unwrap();
        store.insert_route("Thrissur", "Kochi").await.unwrap();

        let all = store.list_routes(&RouteFilter::default()).await.unwrap();
        assert_eq!(all[0].from_location, "Thrissur");
        assert_eq!(all[1].from_location, "Kozhikode");

        let filter = RouteFilter {
            from: Some("KOZHI".into()),
            to: None,
        };
        let filtered = store.list_routes(&filter).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].to_location, "Kannur");
    }

    #[tokio::test]
    async fn timing_batch_is_all_or_nothing() {
        let store = MemoryStore::new();
        let a = station(&store, "A").await;
        let route = store.insert_route("A", "B").await.unwrap();
        let trip = store
            .insert_trip(NewTrip {
                route_id: route.id,
                info: TripInfo::default(),
            })
            .await
            .unwrap();

        let batch = vec![timing(trip.id, a.id, 1), timing(trip.id, StationId(999), 2)];
        let err = store.insert_timings(batch).await.unwrap_err();
        assert!(matches!(err, StoreError::Constraint { .. }));
        assert_eq!(store.counts().await.3, 0);
    }

    #[tokio::test]
    async fn duplicate_position_in_batch_conflicts() {
        let store = MemoryStore::new();
        let a = station(&store, "A").await;
        let route = store.insert_route("A", "B").await.unwrap();
        let trip = store
            .insert_trip(NewTrip {
                route_id: route.id,
                info: TripInfo::default(),
            })
            .await
            .unwrap();

        let batch = vec![timing(trip.id, a.id, 1), timing(trip.id, a.id, 1)];
        let err = store.insert_timings(batch).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn calling_at_returns_full_stop_lists() {
        let store = MemoryStore::new();
        let a = station(&store, "A").await;
        let b = station(&store, "B").await;
        let c = station(&store, "C").await;
        let route = store.insert_route("A", "C").await.unwrap();
        let trip = store
            .insert_trip(NewTrip {
                route_id: route.id,
                info: TripInfo::default(),
            })
            .await
            .unwrap();
        store
            .insert_timings(vec![
                timing(trip.id, a.id, 1),
                timing(trip.id, b.id, 2),
                timing(trip.id, c.id, 3),
            ])
            .await
            .unwrap();

        let records = store.list_trips_calling_at(&[b.id]).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].stops.len(), 3);
        assert_eq!(records[0].route.as_ref().map(|r| r.id), Some(route.id));

        assert!(store.list_trips_calling_at(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_trip_cascades_and_frees_route() {
        let store = MemoryStore::new();
        let a = station(&store, "A").await;
        let route = store.insert_route("A", "B").await.unwrap();
        let trip = store
            .insert_trip(NewTrip {
                route_id: route.id,
                info: TripInfo::default(),
            })
            .await
            .unwrap();
        store
            .insert_timings(vec![timing(trip.id, a.id, 1)])
            .await
            .unwrap();

        assert!(store.delete_route(route.id).await.is_err());
        store.delete_trip(trip.id).await.unwrap();
        store.delete_route(route.id).await.unwrap();
        assert_eq!(store.counts().await, (1, 0, 0, 0));
    }

    #[test]
    fn seed_with_dangling_reference_rejected() {
        let seed: SeedData = serde_json::from_str(
            r#"{
                "stations": [{"id": 1, "name": "Kannur", "location": null}],
                "routes": [],
                "trips": [{"id": 2, "route_id": 99, "name": "X"}],
                "timings": []
            }"#,
        )
        .unwrap();
        let err = MemoryStore::from_seed(seed).unwrap_err();
        assert!(matches!(err, StoreError::Seed { .. }));
    }

    #[tokio::test]
    async fn load_seed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(
            &path,
            r#"{
                "stations": [
                    {"id": 1, "name": "Kannur", "location": "Kannur"},
                    {"id": 2, "name": "Kozhikode", "location": null}
                ],
                "routes": [{"id": 3, "from_location": "Kannur", "to_location": "Kozhikode"}],
                "trips": [{"id": 4, "route_id": 3, "name": "Night Rider", "category": "ksrtc"}],
                "timings": [
                    {"id": 5, "trip_id": 4, "station_id": 1, "arrival": null,
                     "departure": "22:00:00", "sequence": 1},
                    {"id": 6, "trip_id": 4, "station_id": 2, "arrival": "23:00:00",
                     "departure": null, "stop_duration": "0 minutes", "sequence": 2}
                ]
            }"#,
        )
        .unwrap();

        let store = MemoryStore::load(&path).unwrap();
        assert_eq!(store.counts().await, (2, 1, 1, 2));

        // New ids continue after the highest seeded id
        let s = station(&store, "Manjeri").await;
        assert_eq!(s.id, StationId(7));
    }

    #[test]
    fn missing_seed_file_is_error() {
        let err = MemoryStore::load("/nonexistent/seed.json").unwrap_err();
        assert!(matches!(err, StoreError::Seed { .. }));
    }
}
