//! Bus trips and their categories.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{RouteId, TripId};

/// Error returned when parsing an unknown bus category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown bus category: {0}")]
pub struct InvalidCategory(String);

/// Service category of a bus.
///
/// # Examples
///
/// ```
/// use bus_server::domain::BusCategory;
///
/// let c: BusCategory = "limited_stop".parse().unwrap();
/// assert_eq!(c, BusCategory::LimitedStop);
/// assert_eq!(c.label(), "Limited Stop");
/// assert_eq!(c.as_str(), "limited_stop");
/// assert!("express".parse::<BusCategory>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusCategory {
    #[default]
    Local,
    LimitedStop,
    Ksrtc,
}

impl BusCategory {
    /// All categories, in form display order.
    pub const ALL: [BusCategory; 3] = [
        BusCategory::Local,
        BusCategory::LimitedStop,
        BusCategory::Ksrtc,
    ];

    /// Stored form, e.g. "limited_stop".
    pub fn as_str(&self) -> &'static str {
        match self {
            BusCategory::Local => "local",
            BusCategory::LimitedStop => "limited_stop",
            BusCategory::Ksrtc => "ksrtc",
        }
    }

    /// Human-readable label for forms.
    pub fn label(&self) -> &'static str {
        match self {
            BusCategory::Local => "Local",
            BusCategory::LimitedStop => "Limited Stop",
            BusCategory::Ksrtc => "KSRTC",
        }
    }
}

impl fmt::Display for BusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BusCategory {
    type Err = InvalidCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BusCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| InvalidCategory(s.to_string()))
    }
}

/// Descriptive fields of a trip, as entered by contributors.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TripInfo {
    pub name: String,
    pub bus_number: Option<String>,
    pub operator: Option<String>,
    pub contact: Option<String>,
    #[serde(default)]
    pub category: BusCategory,
    pub total_duration: Option<String>,
}

/// One scheduled bus journey on a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    pub route_id: RouteId,
    #[serde(flatten)]
    pub info: TripInfo,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A trip not yet written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTrip {
    pub route_id: RouteId,
    pub info: TripInfo,
}
