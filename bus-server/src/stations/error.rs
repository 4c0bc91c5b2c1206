//! Station directory error types.

use crate::domain::ValidationError;
use crate::store::StoreError;

/// Errors from station directory operations.
#[derive(Debug, thiserror::Error)]
pub enum StationError {
    /// The submitted station was rejected before any write
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The store failed to read or write stations
    #[error("station store error: {0}")]
    Store(#[from] StoreError),
}
