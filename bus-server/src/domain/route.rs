//! Routes: origin/destination label pairs that group trips.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RouteId;

/// A route between two free-text locations.
///
/// The labels are not station references. Routes are unique per exact
/// text pair, so "Kochi" and "kochi" are different routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    pub from_location: String,
    pub to_location: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Route {
    /// Whether this route has exactly the given labels.
    pub fn has_pair(&self, from: &str, to: &str) -> bool {
        self.from_location == from && self.to_location == to
    }

    /// Heading shown on listings, e.g. "Kozhikode → Kannur".
    pub fn title(&self) -> String {
        format!("{} → {}", self.from_location, self.to_location)
    }
}

/// Optional substring filters for route listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteFilter {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl RouteFilter {
    /// Whether any filter is set.
    pub fn is_active(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    /// Case-insensitive substring match on each set label.
    pub fn matches(&self, route: &Route) -> bool {
        let label_matches = |filter: &Option<String>, label: &str| {
            filter
                .as_deref()
                .is_none_or(|f| label.to_lowercase().contains(&f.to_lowercase()))
        };
        label_matches(&self.from, &route.from_location) && label_matches(&self.to, &route.to_location)
    }
}
