//! Draft validation.
//!
//! Everything a submission can get wrong is caught here, before the first
//! write. Messages are shown to the contributor as-is.

use crate::domain::{
    BusCategory, StationId, StopDuration, TimeOfDay, TripInfo, ValidationError,
};

use super::draft::TripDraft;

/// A stop that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedStop {
    pub station_id: StationId,
    pub arrival: Option<TimeOfDay>,
    pub departure: TimeOfDay,
    pub stop_duration: StopDuration,
    /// 1-based position, in submission order.
    pub sequence: u32,
}

/// A draft that passed validation and is ready to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTrip {
    pub from_location: String,
    pub to_location: String,
    pub info: TripInfo,
    pub stops: Vec<ValidatedStop>,
}

/// Trimmed text, or `None` when blank.
fn optional(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Check a draft and convert it into typed values.
pub fn validate(draft: &TripDraft) -> Result<ValidatedTrip, ValidationError> {
    let from_location = draft.from_location.trim();
    let to_location = draft.to_location.trim();
    if from_location.is_empty() || to_location.is_empty() {
        return Err(ValidationError::new("From and To locations are required"));
    }

    let name = draft.bus_name.trim();
    if name.is_empty() {
        return Err(ValidationError::new("Bus name is required"));
    }

    let stops = draft.stops();
    if stops.len() < 2 {
        return Err(ValidationError::new("At least 2 stations are required"));
    }

    // Presence first, in the order the form reports it
    for stop in stops {
        if stop.station_id.trim().is_empty() {
            return Err(ValidationError::new("All stations must be selected"));
        }
        if stop.departure.trim().is_empty() {
            return Err(ValidationError::new("All stations must have departure time"));
        }
    }

    let category = if draft.category.trim().is_empty() {
        BusCategory::default()
    } else {
        draft
            .category
            .parse::<BusCategory>()
            .map_err(|e| ValidationError::new(format!("Invalid category: {e}")))?
    };

    let stops = stops
        .iter()
        .enumerate()
        .map(|(i, stop)| {
            let position = i + 1;
            let station_id = stop
                .station_id
                .parse::<StationId>()
                .map_err(|_| ValidationError::new("All stations must be selected"))?;

            let departure = TimeOfDay::parse(&stop.departure).map_err(|_| {
                ValidationError::new(format!("Station {position}: invalid departure time"))
            })?;

            let arrival = match optional(&stop.arrival) {
                Some(text) => Some(TimeOfDay::parse(&text).map_err(|_| {
                    ValidationError::new(format!("Station {position}: invalid arrival time"))
                })?),
                None => None,
            };

            let stop_duration = match optional(&stop.stop_duration) {
                Some(text) => StopDuration::parse(&text).map_err(|_| {
                    ValidationError::new(format!(
                        "Station {position}: stop duration must be a whole number of minutes"
                    ))
                })?,
                None => StopDuration::default(),
            };

            Ok(ValidatedStop {
                station_id,
                arrival,
                departure,
                stop_duration,
                sequence: position as u32,
            })
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;

    Ok(ValidatedTrip {
        from_location: from_location.to_string(),
        to_location: to_location.to_string(),
        info: TripInfo {
            name: name.to_string(),
            bus_number: optional(&draft.bus_number),
            operator: optional(&draft.operator),
            contact: optional(&draft.contact),
            category,
            total_duration: optional(&draft.total_duration),
        },
        stops,
    })
}
