//! Free-text station name resolution.
//!
//! A query resolves to every station whose display name contains it,
//! ignoring case. Names are not unique, so the result is always a set and
//! no candidate is preferred over another.

use std::collections::HashSet;

use crate::domain::{Station, StationId};

/// Maximum number of autocomplete suggestions returned.
pub const MAX_SUGGESTIONS: usize = 50;

/// Default number of autocomplete suggestions.
pub const DEFAULT_SUGGESTIONS: usize = 10;

/// Ids of every station whose name contains `query`, ignoring case.
///
/// The query is matched as given, surrounding spaces included. A blank
/// query resolves to nothing rather than to every station.
pub fn resolve_candidates(stations: &[Station], query: &str) -> HashSet<StationId> {
    if query.trim().is_empty() {
        return HashSet::new();
    }
    let needle = query.to_lowercase();

    stations
        .iter()
        .filter(|s| s.name_contains_lower(&needle))
        .map(|s| s.id)
        .collect()
}

/// Stations matching `query` for autocomplete, ordered by name.
///
/// `limit` is clamped to `1..=MAX_SUGGESTIONS`.
pub fn suggest(stations: &[Station], query: &str, limit: usize) -> Vec<Station> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<Station> = stations
        .iter()
        .filter(|s| s.name_contains_lower(&needle))
        .cloned()
        .collect();

    matches.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    matches.truncate(limit.clamp(1, MAX_SUGGESTIONS));
    matches
}
