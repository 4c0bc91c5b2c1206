//! Trip search.
//!
//! Answers "which buses go between these two places?" given two free-text
//! station name fragments. Each fragment resolves to a set of candidate
//! stations; a trip matches when its stop list contains a candidate from
//! each set.

mod config;
mod matching;

pub use config::SearchConfig;
pub use matching::{SearchError, TripFinder, TripMatch};
