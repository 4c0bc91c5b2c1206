//! Bus station directory.
//!
//! Lists and adds stations, and resolves free-text queries to candidate
//! station sets for search and autocomplete.

mod cache;
mod directory;
mod error;
mod resolve;

pub use cache::{StationCache, StationCacheConfig, StationList};
pub use directory::StationDirectory;
pub use error::StationError;
pub use resolve::{DEFAULT_SUGGESTIONS, MAX_SUGGESTIONS, resolve_candidates, suggest};
