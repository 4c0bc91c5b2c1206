//! Domain error types.
//!
//! These errors represent validation failures and data inconsistencies
//! in the domain layer. They are distinct from store/IO errors.

use super::TripId;

/// Domain-level errors for data consistency.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Two stop timings of one trip share a sequence position
    #[error("trip {trip} has more than one stop at position {sequence}")]
    DuplicateSequence { trip: TripId, sequence: u32 },
}

/// Input rejected before anything is written.
///
/// The message is shown to the contributor verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}
