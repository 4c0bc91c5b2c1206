//! Bus stations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::StationId;

/// A named bus stop.
///
/// Names are not unique: two stations may share a display name (e.g. an
/// old and a new stand in the same town), so lookups by name always yield
/// a set of stations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub location: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Station {
    /// Whether the display name contains `needle`, ignoring case.
    ///
    /// `needle` must already be lowercased.
    pub fn name_contains_lower(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
    }
}

/// A station not yet written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStation {
    pub name: String,
    pub location: Option<String>,
}
