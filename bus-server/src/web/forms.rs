//! Decoding the trip authoring form.
//!
//! The form posts the draft's fields plus indexed stop fields
//! (`stop_station_0`, `stop_departure_1`, ...) and the name of the button
//! that was pressed in `action`. Decoding rebuilds the draft by replaying
//! the stop fields as draft commands.

use std::collections::BTreeMap;

use crate::authoring::{DraftCommand, StopField, TripDraft};

/// What the contributor asked the form to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction {
    /// Edit the stop list and show the form again.
    Edit(DraftCommand),
    /// Validate and save the trip.
    Submit,
}

impl FormAction {
    /// Parse the `action` button value. Unknown values submit.
    fn parse(value: &str) -> Self {
        match value.trim() {
            "add_stop" => FormAction::Edit(DraftCommand::AddStop),
            other => match other
                .strip_prefix("remove_stop:")
                .and_then(|i| i.parse::<usize>().ok())
            {
                Some(index) => FormAction::Edit(DraftCommand::RemoveStop(index)),
                None => FormAction::Submit,
            },
        }
    }
}

/// A stop field key, e.g. `stop_arrival_2`.
fn stop_field(key: &str, value: String) -> Option<(usize, StopField)> {
    let rest = key.strip_prefix("stop_")?;
    let (name, index) = rest.rsplit_once('_')?;
    let index = index.parse().ok()?;

    let field = match name {
        "station" => StopField::Station(value),
        "arrival" => StopField::Arrival(value),
        "departure" => StopField::Departure(value),
        "duration" => StopField::StopDuration(value),
        _ => return None,
    };
    Some((index, field))
}

/// Rebuild the draft from posted pairs, and find the requested action.
pub fn decode_trip_form(pairs: Vec<(String, String)>) -> (TripDraft, FormAction) {
    let mut draft = TripDraft::with_stops(Vec::new());
    let mut action = FormAction::Submit;
    let mut stops: BTreeMap<usize, Vec<StopField>> = BTreeMap::new();

    for (key, value) in pairs {
        match key.as_str() {
            "from_location" => draft.from_location = value,
            "to_location" => draft.to_location = value,
            "bus_name" => draft.bus_name = value,
            "bus_number" => draft.bus_number = value,
            "operator" => draft.operator = value,
            "contact" => draft.contact = value,
            "total_duration" => draft.total_duration = value,
            "category" => draft.category = value,
            "action" => action = FormAction::parse(&value),
            _ => {
                if let Some((index, field)) = stop_field(&key, value) {
                    stops.entry(index).or_default().push(field);
                }
            }
        }
    }

    // Indexes are compacted: a gap in the posted indexes is not a stop
    for (position, fields) in stops.into_values().enumerate() {
        draft = draft.apply(DraftCommand::AddStop);
        for field in fields {
            draft = draft.apply(DraftCommand::UpdateStopField(position, field));
        }
    }

    (draft, action)
}
