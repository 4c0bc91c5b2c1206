//! Trip matching.
//!
//! Resolves both queries to candidate station sets, loads every trip that
//! calls at a candidate, and keeps the trips that call at both a "from"
//! candidate and a "to" candidate.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::domain::{Route, ScheduledStop, StationId, Trip, TripSchedule};
use crate::stations::{StationDirectory, StationError};
use crate::store::{StationStore, StoreError, TripStore};

use super::config::SearchConfig;

/// Error from trip search.
///
/// Never shown to users: [`TripFinder::find_trips`] logs it and returns no
/// trips.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Failed to resolve a query to stations
    #[error("failed to resolve stations: {0}")]
    Stations(#[from] StationError),

    /// Failed to load trips
    #[error("failed to load trips: {0}")]
    Store(#[from] StoreError),
}

/// A trip that serves both queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripMatch {
    schedule: TripSchedule,
    from_index: usize,
    to_index: usize,
}

impl TripMatch {
    pub fn trip(&self) -> &Trip {
        self.schedule.trip()
    }

    pub fn route(&self) -> Option<&Route> {
        self.schedule.route()
    }

    /// The full stop list in travel order.
    pub fn stops(&self) -> &[ScheduledStop] {
        self.schedule.stops()
    }

    /// Index into [`stops`](Self::stops) of the "from" anchor.
    pub fn from_index(&self) -> usize {
        self.from_index
    }

    /// Index into [`stops`](Self::stops) of the "to" anchor.
    pub fn to_index(&self) -> usize {
        self.to_index
    }

    pub fn from_stop(&self) -> &ScheduledStop {
        &self.schedule.stops()[self.from_index]
    }

    pub fn to_stop(&self) -> &ScheduledStop {
        &self.schedule.stops()[self.to_index]
    }

    /// Whether the "to" anchor comes after the "from" anchor.
    pub fn is_forward(&self) -> bool {
        self.from_index < self.to_index
    }
}

/// Match a schedule against the candidate sets.
///
/// The "from" anchor is the first stop in `from`. The "to" anchor is the
/// first stop in `to`, or with `enforce_direction` the first stop in `to`
/// after the "from" anchor.
fn match_schedule(
    schedule: TripSchedule,
    from: &HashSet<StationId>,
    to: &HashSet<StationId>,
    enforce_direction: bool,
) -> Option<TripMatch> {
    let stops = schedule.stops();
    let from_index = stops.iter().position(|s| from.contains(&s.station_id()))?;

    let to_index = if enforce_direction {
        stops[from_index + 1..]
            .iter()
            .position(|s| to.contains(&s.station_id()))
            .map(|offset| from_index + 1 + offset)?
    } else {
        stops.iter().position(|s| to.contains(&s.station_id()))?
    };

    Some(TripMatch {
        schedule,
        from_index,
        to_index,
    })
}

/// Trip search over a store.
pub struct TripFinder<'a, S> {
    store: &'a S,
    stations: &'a StationDirectory<S>,
    config: &'a SearchConfig,
}

impl<'a, S: StationStore + TripStore> TripFinder<'a, S> {
    /// Create a new finder.
    pub fn new(store: &'a S, stations: &'a StationDirectory<S>, config: &'a SearchConfig) -> Self {
        Self {
            store,
            stations,
            config,
        }
    }

    /// Trips calling at a stop matching `from` and a stop matching `to`.
    ///
    /// Results keep the order the store returned them in. Any failure is
    /// logged and yields no trips.
    pub async fn find_trips(&self, from: &str, to: &str) -> Vec<TripMatch> {
        match self.try_find_trips(from, to).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!(from, to, error = %e, "trip search failed");
                Vec::new()
            }
        }
    }

    /// Like [`find_trips`](Self::find_trips), but reporting failures.
    pub async fn try_find_trips(&self, from: &str, to: &str) -> Result<Vec<TripMatch>, SearchError> {
        let from_ids = self.stations.resolve_candidates(from).await?;
        let to_ids = self.stations.resolve_candidates(to).await?;
        if from_ids.is_empty() || to_ids.is_empty() {
            debug!(from, to, "no candidate stations");
            return Ok(Vec::new());
        }

        let mut candidates: Vec<StationId> = from_ids.union(&to_ids).copied().collect();
        candidates.sort_unstable();

        let records = self.store.list_trips_calling_at(&candidates).await?;
        let considered = records.len();

        let matches: Vec<TripMatch> = records
            .into_iter()
            .filter_map(TripSchedule::from_record_or_warn)
            .filter_map(|schedule| {
                match_schedule(schedule, &from_ids, &to_ids, self.config.enforce_direction)
            })
            .collect();

        debug!(
            from,
            to,
            considered,
            matched = matches.len(),
            "trip search complete"
        );
        Ok(matches)
    }
}

