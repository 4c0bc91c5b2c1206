//! Trips assembled with their ordered stop lists.
//!
//! Stores hand back a trip with its timing rows in whatever order the
//! backend produced them. `TripSchedule` is the ordered form: stops sorted
//! by sequence position with no duplicate positions. Everything that walks
//! a trip's stops in travel order works on a `TripSchedule`.

use tracing::warn;

use super::{DomainError, Route, ScheduledStop, Trip};

/// A trip with its stops, in storage order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripRecord {
    pub trip: Trip,
    /// The owning route, when the backend joined it.
    pub route: Option<Route>,
    pub stops: Vec<ScheduledStop>,
}

/// A trip whose stops are in travel order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripSchedule {
    trip: Trip,
    route: Option<Route>,
    stops: Vec<ScheduledStop>,
}

impl TripSchedule {
    /// Sort a record's stops by sequence position.
    ///
    /// Fails if two stops claim the same position.
    pub fn from_record(record: TripRecord) -> Result<Self, DomainError> {
        let TripRecord {
            trip,
            route,
            mut stops,
        } = record;

        stops.sort_by_key(ScheduledStop::sequence);

        if let Some(pair) = stops
            .windows(2)
            .find(|pair| pair[0].sequence() == pair[1].sequence())
        {
            return Err(DomainError::DuplicateSequence {
                trip: trip.id,
                sequence: pair[0].sequence(),
            });
        }

        Ok(Self { trip, route, stops })
    }

    /// Like [`from_record`](Self::from_record), but logs and drops a trip
    /// with inconsistent positions so one bad row does not hide the rest.
    pub fn from_record_or_warn(record: TripRecord) -> Option<Self> {
        match Self::from_record(record) {
            Ok(schedule) => Some(schedule),
            Err(e) => {
                warn!(error = %e, "skipping trip with inconsistent stop order");
                None
            }
        }
    }

    pub fn trip(&self) -> &Trip {
        &self.trip
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    /// Stops in ascending sequence order.
    pub fn stops(&self) -> &[ScheduledStop] {
        &self.stops
    }

    /// Whether the trip has enough stops to be a journey.
    pub fn is_complete(&self) -> bool {
        self.stops.len() >= 2
    }
}
