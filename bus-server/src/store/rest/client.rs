//! HTTP client for the hosted database's REST API.
//!
//! The hosted database exposes each table at `{base_url}/rest/v1/{table}`
//! with filters in the query string (`col=eq.value`, `col=ilike.*text*`,
//! `col=in.(1,2)`). Writes ask for the written rows back with
//! `Prefer: return=representation`.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::domain::{
    NewStation, NewStopTiming, NewTrip, Route, RouteFilter, RouteId, Station, StationId, Trip,
    TripId, TripRecord,
};
use crate::store::error::StoreError;
use crate::store::{RouteStore, StationStore, TripStore};

use super::types::*;

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Select clause embedding a trip's route and timings with their stations.
const TRIP_SELECT: &str = "*,routes(*),trip_timings(*,bus_stations(*))";

/// Media type asking for a single JSON object instead of an array.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Configuration for the REST store.
#[derive(Debug, Clone)]
pub struct RestStoreConfig {
    /// Project URL, without the `/rest/v1` suffix
    pub base_url: String,
    /// Anonymous API key
    pub api_key: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl RestStoreConfig {
    /// Create a new config with the given project URL and key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 30,
        }
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Store backed by the hosted database's REST API.
///
/// Uses a semaphore to bound concurrent requests.
#[derive(Debug, Clone)]
pub struct RestStore {
    http: reqwest::Client,
    base_url: String,
    semaphore: Arc<Semaphore>,
}

impl RestStore {
    /// Create a new REST store client.
    pub fn new(config: RestStoreConfig) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();

        let invalid_key = || StoreError::Api {
            status: 0,
            message: "Invalid API key format".to_string(),
        };
        let api_key = HeaderValue::from_str(&config.api_key).map_err(|_| invalid_key())?;
        let bearer =
            HeaderValue::from_str(&format!("Bearer {}", config.api_key)).map_err(|_| invalid_key())?;
        headers.insert(HeaderName::from_static("apikey"), api_key);
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Send a request, holding a permit for its duration.
    async fn send(
        &self,
        table: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, StoreError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| StoreError::Api {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        let response = request.send().await?;
        let status = response.status();
        debug!(table, status = status.as_u16(), "database request");

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(StoreError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(table, status.as_u16(), &body));
        }

        Ok(response)
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        table: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, StoreError> {
        let response = self.send(table, request).await?;
        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| StoreError::Json {
            message: format!("{table}: {e} (body: {})", body.chars().take(500).collect::<String>()),
        })
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &'static str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, StoreError> {
        let request = self.http.get(self.table_url(table)).query(query);
        self.read_json(table, request).await
    }

    async fn select_single<T: DeserializeOwned>(
        &self,
        table: &'static str,
        query: &[(&str, String)],
    ) -> Result<T, StoreError> {
        let request = self
            .http
            .get(self.table_url(table))
            .header(ACCEPT, SINGLE_OBJECT)
            .query(query);
        self.read_json(table, request).await
    }

    async fn insert_returning<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &'static str,
        body: &B,
    ) -> Result<T, StoreError> {
        let request = self
            .http
            .post(self.table_url(table))
            .header(ACCEPT, SINGLE_OBJECT)
            .header("Prefer", "return=representation")
            .json(body);
        self.read_json(table, request).await
    }

    async fn delete_where(&self, table: &'static str, column: &str, id: i64) -> Result<(), StoreError> {
        let request = self
            .http
            .delete(self.table_url(table))
            .query(&[(column, format!("eq.{id}"))]);
        self.send(table, request).await?;
        Ok(())
    }
}

/// Map an error response to a store error.
fn classify_error(table: &'static str, status: u16, body: &str) -> StoreError {
    let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .clone()
        .or_else(|| parsed.details.clone())
        .unwrap_or_else(|| body.to_string());

    match parsed.code.as_deref() {
        Some(NO_ROWS_CODE) => StoreError::NotFound { table },
        Some(UNIQUE_VIOLATION) => StoreError::Conflict { table, message },
        Some(FOREIGN_KEY_VIOLATION) => StoreError::Constraint { table, message },
        _ if status == 409 => StoreError::Conflict { table, message },
        _ => StoreError::Api { status, message },
    }
}

/// Build an `in.(...)` filter value.
fn in_list<T: std::fmt::Display>(ids: impl IntoIterator<Item = T>) -> String {
    let ids: Vec<String> = ids.into_iter().map(|id| id.to_string()).collect();
    format!("in.({})", ids.join(","))
}

/// Build an `ilike` filter value matching `text` anywhere.
fn ilike_contains(text: &str) -> String {
    // `*` is the REST wildcard; `%` and `_` are LIKE wildcards and must be escaped.
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("ilike.*{escaped}*")
}

impl StationStore for RestStore {
    async fn list_stations(&self) -> Result<Vec<Station>, StoreError> {
        let rows: Vec<StationRow> = self
            .select(
                "bus_stations",
                &[("select", "*".to_string()), ("order", "station_name".to_string())],
            )
            .await?;
        Ok(rows.into_iter().map(Station::from).collect())
    }

    async fn insert_station(&self, station: NewStation) -> Result<Station, StoreError> {
        let row: StationRow = self
            .insert_returning(
                "bus_stations",
                &NewStationRow {
                    station_name: &station.name,
                    location: station.location.as_deref(),
                },
            )
            .await?;
        Ok(row.into())
    }
}

impl RouteStore for RestStore {
    async fn find_route_by_pair(&self, from: &str, to: &str) -> Result<Route, StoreError> {
        let row: RouteRow = self
            .select_single(
                "routes",
                &[
                    ("select", "*".to_string()),
                    ("from_location", format!("eq.{from}")),
                    ("to_location", format!("eq.{to}")),
                ],
            )
            .await?;
        Ok(row.into())
    }

    async fn insert_route(&self, from: &str, to: &str) -> Result<Route, StoreError> {
        let row: RouteRow = self
            .insert_returning(
                "routes",
                &NewRouteRow {
                    from_location: from,
                    to_location: to,
                },
            )
            .await?;
        Ok(row.into())
    }

    async fn get_route(&self, id: RouteId) -> Result<Route, StoreError> {
        let row: RouteRow = self
            .select_single(
                "routes",
                &[("select", "*".to_string()), ("id", format!("eq.{id}"))],
            )
            .await?;
        Ok(row.into())
    }

    async fn list_routes(&self, filter: &RouteFilter) -> Result<Vec<Route>, StoreError> {
        let mut query = vec![
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
        ];
        if let Some(from) = &filter.from {
            query.push(("from_location", ilike_contains(from)));
        }
        if let Some(to) = &filter.to {
            query.push(("to_location", ilike_contains(to)));
        }

        let rows: Vec<RouteRow> = self.select("routes", &query).await?;
        Ok(rows.into_iter().map(Route::from).collect())
    }

    async fn delete_route(&self, id: RouteId) -> Result<(), StoreError> {
        self.delete_where("routes", "id", id.0).await
    }
}

impl TripStore for RestStore {
    async fn list_trips_for_route(&self, route: RouteId) -> Result<Vec<TripRecord>, StoreError> {
        let rows: Vec<BusRow> = self
            .select(
                "buses",
                &[
                    ("select", TRIP_SELECT.to_string()),
                    ("route_id", format!("eq.{route}")),
                    ("order", "created_at.asc".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(TripRecord::from).collect())
    }

    async fn list_trips_calling_at(
        &self,
        stations: &[StationId],
    ) -> Result<Vec<TripRecord>, StoreError> {
        if stations.is_empty() {
            return Ok(Vec::new());
        }

        let calls: Vec<TimingTripRow> = self
            .select(
                "trip_timings",
                &[
                    ("select", "bus_id".to_string()),
                    ("station_id", in_list(stations)),
                ],
            )
            .await?;

        let mut trip_ids: Vec<i64> = calls.into_iter().map(|c| c.bus_id).collect();
        trip_ids.sort_unstable();
        trip_ids.dedup();
        if trip_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<BusRow> = self
            .select(
                "buses",
                &[
                    ("select", TRIP_SELECT.to_string()),
                    ("id", in_list(trip_ids)),
                    ("order", "id".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(TripRecord::from).collect())
    }

    async fn insert_trip(&self, trip: NewTrip) -> Result<Trip, StoreError> {
        let info = &trip.info;
        let row: BusRow = self
            .insert_returning(
                "buses",
                &NewBusRow {
                    route_id: trip.route_id.0,
                    bus_name: &info.name,
                    bus_number: info.bus_number.as_deref(),
                    operator_name: info.operator.as_deref(),
                    contact: info.contact.as_deref(),
                    category: info.category,
                    total_duration: info.total_duration.as_deref(),
                },
            )
            .await?;
        Ok(row.into())
    }

    async fn delete_trip(&self, id: TripId) -> Result<(), StoreError> {
        self.delete_where("trip_timings", "bus_id", id.0).await?;
        self.delete_where("buses", "id", id.0).await
    }

    async fn insert_timings(&self, timings: Vec<NewStopTiming>) -> Result<(), StoreError> {
        let rows: Vec<NewTimingRow> = timings
            .into_iter()
            .map(|t| NewTimingRow {
                bus_id: t.trip_id.0,
                station_id: t.station_id.0,
                arrival_time: t.arrival,
                departure_time: t.departure,
                stop_duration: t.stop_duration,
                sequence_order: t.sequence,
            })
            .collect();

        let request = self
            .http
            .post(self.table_url("trip_timings"))
            .header("Prefer", "return=minimal")
            .json(&rows);
        self.send("trip_timings", request).await?;
        Ok(())
    }
}
