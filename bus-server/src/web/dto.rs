//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{Route, ScheduledStop, Station};
use crate::search::TripMatch;

/// Query string of the trip search.
#[derive(Debug, Default, Deserialize)]
pub struct TripSearchRequest {
    /// Free-text "from" station fragment
    #[serde(default)]
    pub from: String,

    /// Free-text "to" station fragment
    #[serde(default)]
    pub to: String,
}

impl TripSearchRequest {
    /// Whether both fragments were given.
    pub fn is_complete(&self) -> bool {
        !self.from.trim().is_empty() && !self.to.trim().is_empty()
    }
}

/// Trip search results.
#[derive(Debug, Serialize)]
pub struct TripSearchResponse {
    pub from: String,
    pub to: String,
    pub trips: Vec<TripMatchResult>,
}

/// A matching trip.
#[derive(Debug, Serialize)]
pub struct TripMatchResult {
    pub trip_id: i64,
    pub name: String,
    pub bus_number: Option<String>,
    pub operator: Option<String>,
    pub contact: Option<String>,
    /// Stored category, e.g. "limited_stop"
    pub category: String,
    pub total_duration: Option<String>,
    pub route: Option<RouteResult>,

    /// Index into `stops` of the "from" anchor
    pub from_index: usize,

    /// Index into `stops` of the "to" anchor
    pub to_index: usize,

    /// Every stop of the trip, in travel order
    pub stops: Vec<StopResult>,
}

impl TripMatchResult {
    pub fn from_match(m: &TripMatch) -> Self {
        let info = &m.trip().info;
        Self {
            trip_id: m.trip().id.0,
            name: info.name.clone(),
            bus_number: info.bus_number.clone(),
            operator: info.operator.clone(),
            contact: info.contact.clone(),
            category: info.category.as_str().to_string(),
            total_duration: info.total_duration.clone(),
            route: m.route().map(RouteResult::from_route),
            from_index: m.from_index(),
            to_index: m.to_index(),
            stops: m.stops().iter().map(StopResult::from_stop).collect(),
        }
    }
}

/// A route in JSON responses.
#[derive(Debug, Serialize)]
pub struct RouteResult {
    pub id: i64,
    pub from_location: String,
    pub to_location: String,
}

impl RouteResult {
    pub fn from_route(route: &Route) -> Self {
        Self {
            id: route.id.0,
            from_location: route.from_location.clone(),
            to_location: route.to_location.clone(),
        }
    }
}

/// A stop in JSON responses. Times are "HH:MM".
#[derive(Debug, Serialize)]
pub struct StopResult {
    pub sequence: u32,
    pub station_id: i64,
    pub station_name: String,
    pub location: Option<String>,
    pub arrival: Option<String>,
    pub departure: Option<String>,
    /// e.g. "5 minutes"
    pub stop_duration: String,
}

impl StopResult {
    pub fn from_stop(stop: &ScheduledStop) -> Self {
        Self {
            sequence: stop.sequence(),
            station_id: stop.station_id().0,
            station_name: stop.station.name.clone(),
            location: stop.station.location.clone(),
            arrival: stop.timing.arrival.map(|t| t.to_string()),
            departure: stop.timing.departure.map(|t| t.to_string()),
            stop_duration: stop.timing.stop_duration.to_string(),
        }
    }
}

/// Station autocomplete request.
#[derive(Debug, Deserialize)]
pub struct StationSearchRequest {
    /// Search query (matches anywhere in the name)
    #[serde(default)]
    pub q: String,

    /// Maximum results (default 10, capped at 50)
    pub limit: Option<usize>,
}

/// Station autocomplete response.
#[derive(Debug, Serialize)]
pub struct StationSearchResponse {
    pub stations: Vec<StationResult>,
}

/// A station in autocomplete results.
#[derive(Debug, Serialize)]
pub struct StationResult {
    pub id: i64,
    pub name: String,
    pub location: Option<String>,
}

impl From<Station> for StationResult {
    fn from(s: Station) -> Self {
        Self {
            id: s.id.0,
            name: s.name,
            location: s.location,
        }
    }
}

/// Route list filters.
#[derive(Debug, Default, Deserialize)]
pub struct RouteListRequest {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Add-station form.
#[derive(Debug, Deserialize)]
pub struct AddStationForm {
    #[serde(default)]
    pub station_name: String,
    #[serde(default)]
    pub location: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
