//! Domain types for the bus timings directory.
//!
//! This module contains the core model: stations, routes, trips and their
//! stop timings. Parsing types (times, durations, categories) validate at
//! construction, so code that receives them can trust their values.

mod error;
mod ids;
mod route;
mod schedule;
mod station;
mod time;
mod timing;
mod trip;

pub use error::{DomainError, ValidationError};
pub use ids::{RouteId, StationId, StopTimingId, TripId};
pub use route::{Route, RouteFilter};
pub use schedule::{TripRecord, TripSchedule};
pub use station::{NewStation, Station};
pub use time::{TimeError, TimeOfDay};
pub use timing::{InvalidStopDuration, NewStopTiming, ScheduledStop, StopDuration, StopTiming};
pub use trip::{BusCategory, InvalidCategory, NewTrip, Trip, TripInfo};
