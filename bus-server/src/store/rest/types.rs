//! Row types of the hosted database's REST API.
//!
//! Column names follow the hosted schema (`bus_stations`, `routes`,
//! `buses`, `trip_timings`), which predates the names used in the domain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    BusCategory, Route, RouteId, ScheduledStop, Station, StationId, StopDuration, StopTiming,
    StopTimingId, TimeOfDay, Trip, TripId, TripInfo, TripRecord,
};

/// Error body returned by the REST API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

/// Error code for "single row requested, zero rows returned".
pub const NO_ROWS_CODE: &str = "PGRST116";

/// Postgres unique violation.
pub const UNIQUE_VIOLATION: &str = "23505";

/// Postgres foreign key violation.
pub const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Debug, Clone, Deserialize)]
pub struct StationRow {
    pub id: i64,
    pub station_name: String,
    pub location: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<StationRow> for Station {
    fn from(row: StationRow) -> Self {
        Station {
            id: StationId(row.id),
            name: row.station_name,
            location: row.location,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NewStationRow<'a> {
    pub station_name: &'a str,
    pub location: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteRow {
    pub id: i64,
    pub from_location: String,
    pub to_location: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<RouteRow> for Route {
    fn from(row: RouteRow) -> Self {
        Route {
            id: RouteId(row.id),
            from_location: row.from_location,
            to_location: row.to_location,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NewRouteRow<'a> {
    pub from_location: &'a str,
    pub to_location: &'a str,
}

/// A `buses` row, optionally with embedded route and timings.
#[derive(Debug, Clone, Deserialize)]
pub struct BusRow {
    pub id: i64,
    pub route_id: i64,
    pub bus_name: Option<String>,
    pub bus_number: Option<String>,
    pub operator_name: Option<String>,
    pub contact: Option<String>,
    pub category: Option<BusCategory>,
    pub total_duration: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub routes: Option<RouteRow>,
    #[serde(default)]
    pub trip_timings: Vec<TimingRow>,
}

impl BusRow {
    fn trip(&self) -> Trip {
        Trip {
            id: TripId(self.id),
            route_id: RouteId(self.route_id),
            info: TripInfo {
                name: self.bus_name.clone().unwrap_or_default(),
                bus_number: self.bus_number.clone(),
                operator: self.operator_name.clone(),
                contact: self.contact.clone(),
                category: self.category.unwrap_or_default(),
                total_duration: self.total_duration.clone(),
            },
            created_at: self.created_at,
        }
    }
}

impl From<BusRow> for Trip {
    fn from(row: BusRow) -> Self {
        row.trip()
    }
}

impl From<BusRow> for TripRecord {
    fn from(row: BusRow) -> Self {
        let trip = row.trip();
        let stops = row
            .trip_timings
            .into_iter()
            .map(|timing| timing.into_stop(trip.id))
            .collect();

        TripRecord {
            trip,
            route: row.routes.map(Route::from),
            stops,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NewBusRow<'a> {
    pub route_id: i64,
    pub bus_name: &'a str,
    pub bus_number: Option<&'a str>,
    pub operator_name: Option<&'a str>,
    pub contact: Option<&'a str>,
    pub category: BusCategory,
    pub total_duration: Option<&'a str>,
}

/// A `trip_timings` row, optionally with its embedded station.
#[derive(Debug, Clone, Deserialize)]
pub struct TimingRow {
    pub id: i64,
    #[serde(default)]
    pub bus_id: Option<i64>,
    pub station_id: i64,
    pub arrival_time: Option<TimeOfDay>,
    pub departure_time: Option<TimeOfDay>,
    #[serde(default)]
    pub stop_duration: Option<StopDuration>,
    pub sequence_order: u32,
    #[serde(default)]
    pub bus_stations: Option<StationRow>,
}

impl TimingRow {
    fn into_stop(self, trip_id: TripId) -> ScheduledStop {
        let station_id = StationId(self.station_id);
        let station = self.bus_stations.map(Station::from).unwrap_or(Station {
            id: station_id,
            name: "Unknown Station".to_string(),
            location: None,
            created_at: None,
        });

        ScheduledStop {
            timing: StopTiming {
                id: StopTimingId(self.id),
                trip_id: self.bus_id.map(TripId).unwrap_or(trip_id),
                station_id,
                arrival: self.arrival_time,
                departure: self.departure_time,
                stop_duration: self.stop_duration.unwrap_or_default(),
                sequence: self.sequence_order,
            },
            station,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NewTimingRow {
    pub bus_id: i64,
    pub station_id: i64,
    pub arrival_time: Option<TimeOfDay>,
    pub departure_time: Option<TimeOfDay>,
    pub stop_duration: StopDuration,
    pub sequence_order: u32,
}

/// Just the trip id of a timing row.
#[derive(Debug, Clone, Deserialize)]
pub struct TimingTripRow {
    pub bus_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_bus_row_converts() {
        let json = r#"{
            "id": 10,
            "route_id": 3,
            "bus_name": "Night Rider",
            "bus_number": "KL-13-1234",
            "operator_name": null,
            "contact": null,
            "category": "limited_stop",
            "total_duration": "3 hours",
            "created_at": "2024-05-01T10:00:00.123456+00:00",
            "routes": {"id": 3, "from_location": "Kannur", "to_location": "Malappuram"},
            "trip_timings": [
                {"id": 2, "bus_id": 10, "station_id": 2, "arrival_time": "23:00:00",
                 "departure_time": "23:05:00", "stop_duration": "5 minutes", "sequence_order": 2,
                 "bus_stations": {"id": 2, "station_name": "Kozhikode", "location": null}},
                {"id": 1, "bus_id": 10, "station_id": 1, "arrival_time": null,
                 "departure_time": "22:00:00", "stop_duration": null, "sequence_order": 1,
                 "bus_stations": {"id": 1, "station_name": "Kannur", "location": "Kannur"}}
            ]
        }"#;

        let row: BusRow = serde_json::from_str(json).unwrap();
        let record = TripRecord::from(row);

        assert_eq!(record.trip.id, TripId(10));
        assert_eq!(record.trip.info.category, BusCategory::LimitedStop);
        assert_eq!(record.route.unwrap().to_location, "Malappuram");
        // Order is preserved as returned
        assert_eq!(record.stops[0].sequence(), 2);
        assert_eq!(record.stops[1].station.name, "Kannur");
        assert_eq!(record.stops[1].timing.stop_duration.minutes(), 5);
    }

    #[test]
    fn missing_embedded_station_falls_back() {
        let json = r#"{"id": 1, "station_id": 9, "arrival_time": null,
                       "departure_time": "10:00:00", "sequence_order": 1}"#;
        let row: TimingRow = serde_json::from_str(json).unwrap();
        let stop = row.into_stop(TripId(4));
        assert_eq!(stop.station.name, "Unknown Station");
        assert_eq!(stop.station.id, StationId(9));
        assert_eq!(stop.timing.trip_id, TripId(4));
    }

    #[test]
    fn new_timing_row_serializes_storage_forms() {
        let row = NewTimingRow {
            bus_id: 1,
            station_id: 2,
            arrival_time: None,
            departure_time: TimeOfDay::from_hm(6, 30),
            stop_duration: StopDuration::default(),
            sequence_order: 1,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["departure_time"], "06:30:00");
        assert_eq!(json["stop_duration"], "5 minutes");
        assert!(json["arrival_time"].is_null());
    }
}
