//! Store error types.

/// Errors from a timetable store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A single-row lookup found no row. Expected on create-if-missing paths.
    #[error("no matching row in {table}")]
    NotFound { table: &'static str },

    /// A uniqueness constraint rejected the write
    #[error("duplicate row in {table}: {message}")]
    Conflict {
        table: &'static str,
        message: String,
    },

    /// A foreign key or check constraint rejected the write
    #[error("constraint violated in {table}: {message}")]
    Constraint {
        table: &'static str,
        message: String,
    },

    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Authentication with the database API failed
    #[error("unauthorized: check DATABASE_API_KEY")]
    Unauthorized,

    /// The database API returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a response or seed file
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// Failed to read a seed file
    #[error("seed file error: {message}")]
    Seed { message: String },
}

impl StoreError {
    /// Whether this is the expected "no row" outcome of a lookup.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}
