//! The trip being composed in the authoring form.
//!
//! A draft holds raw form text so a rejected submission can be shown back
//! to the contributor unchanged. It is edited only through
//! [`DraftCommand`]s, each of which yields a new snapshot with stop
//! positions renumbered `1..=N`.

use crate::domain::{BusCategory, StopDuration};

/// Number of empty stop rows in a fresh draft.
pub const INITIAL_STOPS: usize = 2;

/// One stop row of the draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopDraft {
    /// Selected station id, empty when none is selected.
    pub station_id: String,
    pub arrival: String,
    pub departure: String,
    /// Minutes the bus waits here.
    pub stop_duration: String,
    /// 1-based position, maintained by the draft.
    pub sequence: u32,
}

impl StopDraft {
    /// An unfilled stop at the given position.
    pub fn empty(sequence: u32) -> Self {
        Self {
            station_id: String::new(),
            arrival: String::new(),
            departure: String::new(),
            stop_duration: StopDuration::DEFAULT_MINUTES.to_string(),
            sequence,
        }
    }
}

/// A field of a stop row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopField {
    Station(String),
    Arrival(String),
    Departure(String),
    StopDuration(String),
}

/// An edit to the draft's stop list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftCommand {
    /// Append an empty stop.
    AddStop,
    /// Remove the stop at this index. Out-of-range indexes are ignored.
    RemoveStop(usize),
    /// Set one field of the stop at this index. Out-of-range indexes are
    /// ignored.
    UpdateStopField(usize, StopField),
}

/// A trip being composed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripDraft {
    pub from_location: String,
    pub to_location: String,
    pub bus_name: String,
    pub bus_number: String,
    pub operator: String,
    pub contact: String,
    pub total_duration: String,
    pub category: String,
    stops: Vec<StopDraft>,
}

impl Default for TripDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl TripDraft {
    /// A fresh draft with two empty stops.
    pub fn new() -> Self {
        Self::with_stops(
            (1..=INITIAL_STOPS as u32).map(StopDraft::empty).collect(),
        )
    }

    /// A draft with the given stops, in order. Positions are renumbered.
    pub fn with_stops(stops: Vec<StopDraft>) -> Self {
        let mut draft = Self {
            from_location: String::new(),
            to_location: String::new(),
            bus_name: String::new(),
            bus_number: String::new(),
            operator: String::new(),
            contact: String::new(),
            total_duration: String::new(),
            category: BusCategory::default().as_str().to_string(),
            stops,
        };
        draft.renumber();
        draft
    }

    /// Stops in order.
    pub fn stops(&self) -> &[StopDraft] {
        &self.stops
    }

    /// Apply a command, producing the next snapshot.
    pub fn apply(mut self, command: DraftCommand) -> Self {
        match command {
            DraftCommand::AddStop => {
                let next = self.stops.len() as u32 + 1;
                self.stops.push(StopDraft::empty(next));
            }
            DraftCommand::RemoveStop(index) => {
                if index < self.stops.len() {
                    self.stops.remove(index);
                }
            }
            DraftCommand::UpdateStopField(index, field) => {
                if let Some(stop) = self.stops.get_mut(index) {
                    match field {
                        StopField::Station(v) => stop.station_id = v,
                        StopField::Arrival(v) => stop.arrival = v,
                        StopField::Departure(v) => stop.departure = v,
                        StopField::StopDuration(v) => stop.stop_duration = v,
                    }
                }
            }
        }
        self.renumber();
        self
    }

    fn renumber(&mut self) {
        for (i, stop) in self.stops.iter_mut().enumerate() {
            stop.sequence = i as u32 + 1;
        }
    }
}
