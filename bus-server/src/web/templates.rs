//! Askama templates for the web frontend.

use askama::Template;

use crate::authoring::{StopDraft, TripDraft};
use crate::domain::{BusCategory, Route, ScheduledStop, Station, Trip, TripSchedule};
use crate::search::TripMatch;

// ============================================================================
// Page Templates (extend base.html)
// ============================================================================

/// Home page with search form and popular routes.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub popular: Vec<PopularRoute>,
}

/// Trip search results.
#[derive(Template)]
#[template(path = "search_results.html")]
pub struct SearchResultsTemplate {
    pub from: String,
    pub to: String,
    /// False when either fragment was missing and no search ran.
    pub searched: bool,
    pub trips: Vec<TripMatchView>,
}

/// Route list.
#[derive(Template)]
#[template(path = "routes.html")]
pub struct RoutesTemplate {
    pub routes: Vec<RouteView>,
    pub from: String,
    pub to: String,
}

impl RoutesTemplate {
    pub fn is_filtered(&self) -> bool {
        !self.from.is_empty() || !self.to.is_empty()
    }
}

/// One route with all its trips.
#[derive(Template)]
#[template(path = "route_detail.html")]
pub struct RouteDetailTemplate {
    pub route: RouteView,
    pub trips: Vec<TripView>,
}

/// Station list and add-station form.
#[derive(Template)]
#[template(path = "stations.html")]
pub struct StationsTemplate {
    pub stations: Vec<StationView>,
    pub notice: Option<Notice>,
    pub name: String,
    pub location: String,
}

/// Trip authoring form.
#[derive(Template)]
#[template(path = "trip_form.html")]
pub struct TripFormTemplate {
    pub form: TripFormView,
    pub stations: Vec<StationView>,
    pub notice: Option<Notice>,
}

/// Page for an unknown route.
#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub message: String,
}

/// Error page.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub title: String,
    pub message: String,
}

// ============================================================================
// View Models (for templates)
// ============================================================================

/// A quick link on the home page.
#[derive(Debug, Clone)]
pub struct PopularRoute {
    pub from: &'static str,
    pub to: &'static str,
}

/// Frequently searched routes.
pub fn popular_routes() -> Vec<PopularRoute> {
    [
        ("Kozhikode", "Kannur"),
        ("Kozhikode", "Malappuram"),
        ("Kochi", "Thiruvananthapuram"),
        ("Kochi", "Kozhikode"),
        ("Thrissur", "Kochi"),
        ("Palakkad", "Kozhikode"),
    ]
    .into_iter()
    .map(|(from, to)| PopularRoute { from, to })
    .collect()
}

/// A success or failure message shown above a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub success: bool,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            success: true,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            success: false,
            text: text.into(),
        }
    }

    /// CSS class for the message box.
    pub fn class(&self) -> &'static str {
        if self.success { "notice success" } else { "notice error" }
    }
}

/// Route view model.
#[derive(Debug, Clone)]
pub struct RouteView {
    pub id: i64,
    pub title: String,
    /// Creation date, e.g. "1 May 2024"
    pub added: Option<String>,
}

impl RouteView {
    pub fn from_route(route: &Route) -> Self {
        Self {
            id: route.id.0,
            title: route.title(),
            added: route.created_at.map(|t| t.format("%-d %b %Y").to_string()),
        }
    }
}

/// Trip header: name and descriptive fields.
#[derive(Debug, Clone)]
pub struct TripHeaderView {
    pub name: String,
    pub bus_number: Option<String>,
    pub category: String,
    pub operator: Option<String>,
    pub total_duration: Option<String>,
    pub contact: Option<String>,
}

impl TripHeaderView {
    pub fn from_trip(trip: &Trip) -> Self {
        let info = &trip.info;
        Self {
            name: info.name.clone(),
            bus_number: info.bus_number.clone(),
            category: info.category.label().to_string(),
            operator: info.operator.clone(),
            total_duration: info.total_duration.clone(),
            contact: info.contact.clone(),
        }
    }
}

/// Which search anchor a stop row is, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    None,
    From,
    To,
}

/// A row of a stop table. Times are 12-hour, e.g. "10:00 PM".
#[derive(Debug, Clone)]
pub struct StopView {
    pub station_name: String,
    pub location: String,
    pub arrival: Option<String>,
    pub departure: Option<String>,
    pub stop_duration: String,
    pub anchor: Anchor,
}

impl StopView {
    pub fn from_stop(stop: &ScheduledStop, anchor: Anchor) -> Self {
        Self {
            station_name: stop.station.name.clone(),
            location: stop.station.location.clone().unwrap_or_default(),
            arrival: stop.timing.arrival.map(|t| t.to_12h()),
            departure: stop.timing.departure.map(|t| t.to_12h()),
            stop_duration: stop.timing.stop_duration.to_string(),
            anchor,
        }
    }

    /// CSS class for the table row.
    pub fn row_class(&self) -> &'static str {
        match self.anchor {
            Anchor::None => "",
            Anchor::From => "anchor-from",
            Anchor::To => "anchor-to",
        }
    }
}

/// A search match: the trip, its two anchors and its full stop list.
#[derive(Debug, Clone)]
pub struct TripMatchView {
    pub header: TripHeaderView,
    pub route_id: Option<i64>,
    pub from: StopView,
    pub to: StopView,
    pub stops: Vec<StopView>,
}

impl TripMatchView {
    pub fn from_match(m: &TripMatch) -> Self {
        let stops = m
            .stops()
            .iter()
            .enumerate()
            .map(|(i, stop)| {
                let anchor = if i == m.from_index() {
                    Anchor::From
                } else if i == m.to_index() {
                    Anchor::To
                } else {
                    Anchor::None
                };
                StopView::from_stop(stop, anchor)
            })
            .collect();

        Self {
            header: TripHeaderView::from_trip(m.trip()),
            route_id: m.route().map(|r| r.id.0),
            from: StopView::from_stop(m.from_stop(), Anchor::From),
            to: StopView::from_stop(m.to_stop(), Anchor::To),
            stops,
        }
    }
}

/// A trip on the route detail page.
#[derive(Debug, Clone)]
pub struct TripView {
    pub header: TripHeaderView,
    pub stops: Vec<StopView>,
}

impl TripView {
    pub fn from_schedule(schedule: &TripSchedule) -> Self {
        Self {
            header: TripHeaderView::from_trip(schedule.trip()),
            stops: schedule
                .stops()
                .iter()
                .map(|s| StopView::from_stop(s, Anchor::None))
                .collect(),
        }
    }
}

/// Station view model, for listings and select boxes.
#[derive(Debug, Clone)]
pub struct StationView {
    pub id: String,
    pub name: String,
    pub location: Option<String>,
}

impl StationView {
    pub fn from_station(station: &Station) -> Self {
        Self {
            id: station.id.to_string(),
            name: station.name.clone(),
            location: station.location.clone(),
        }
    }

    /// Option label, e.g. "Kannur (Kannur Town)".
    pub fn label(&self) -> String {
        match &self.location {
            Some(location) => format!("{} ({})", self.name, location),
            None => self.name.clone(),
        }
    }
}

/// A category choice in the trip form.
#[derive(Debug, Clone)]
pub struct CategoryOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// A stop row in the trip form.
#[derive(Debug, Clone)]
pub struct StopFormView {
    pub index: usize,
    pub sequence: u32,
    pub station_id: String,
    pub arrival: String,
    pub departure: String,
    pub stop_duration: String,
}

impl StopFormView {
    fn from_draft(index: usize, stop: &StopDraft) -> Self {
        Self {
            index,
            sequence: stop.sequence,
            station_id: stop.station_id.clone(),
            arrival: stop.arrival.clone(),
            departure: stop.departure.clone(),
            stop_duration: stop.stop_duration.clone(),
        }
    }

    /// Whether `station` is the selected option of this row.
    pub fn selects(&self, station: &StationView) -> bool {
        self.station_id == station.id
    }
}

/// The trip form's current values.
#[derive(Debug, Clone)]
pub struct TripFormView {
    pub from_location: String,
    pub to_location: String,
    pub bus_name: String,
    pub bus_number: String,
    pub operator: String,
    pub contact: String,
    pub total_duration: String,
    pub categories: Vec<CategoryOption>,
    pub stops: Vec<StopFormView>,
}

impl TripFormView {
    pub fn from_draft(draft: &TripDraft) -> Self {
        let categories = BusCategory::ALL
            .into_iter()
            .map(|c| CategoryOption {
                value: c.as_str(),
                label: c.label(),
                selected: c.as_str() == draft.category.trim(),
            })
            .collect();

        Self {
            from_location: draft.from_location.clone(),
            to_location: draft.to_location.clone(),
            bus_name: draft.bus_name.clone(),
            bus_number: draft.bus_number.clone(),
            operator: draft.operator.clone(),
            contact: draft.contact.clone(),
            total_duration: draft.total_duration.clone(),
            categories,
            stops: draft
                .stops()
                .iter()
                .enumerate()
                .map(|(i, s)| StopFormView::from_draft(i, s))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authoring::{DraftCommand, StopField};
    use crate::domain::{
        RouteId, StationId, StopDuration, StopTiming, StopTimingId, TimeOfDay, TripId, TripInfo,
    };

    fn stop(seq: u32, name: &str, arrival: &str, departure: &str) -> ScheduledStop {
        let time = |s: &str| (!s.is_empty()).then(|| TimeOfDay::parse(s).unwrap());
        ScheduledStop {
            timing: StopTiming {
                id: StopTimingId(seq as i64),
                trip_id: TripId(1),
                station_id: StationId(seq as i64),
                arrival: time(arrival),
                departure: time(departure),
                stop_duration: StopDuration::default(),
                sequence: seq,
            },
            station: Station {
                id: StationId(seq as i64),
                name: name.into(),
                location: Some("Kerala".into()),
                created_at: None,
            },
        }
    }

    #[test]
    fn stop_view_uses_12_hour_times() {
        let view = StopView::from_stop(&stop(2, "Kozhikode", "23:00", "23:05"), Anchor::None);
        assert_eq!(view.arrival.as_deref(), Some("11:00 PM"));
        assert_eq!(view.departure.as_deref(), Some("11:05 PM"));
        assert_eq!(view.stop_duration, "5 minutes");
        assert_eq!(view.row_class(), "");

        let view = StopView::from_stop(&stop(4, "Malappuram", "01:00", ""), Anchor::To);
        assert_eq!(view.arrival.as_deref(), Some("01:00 AM"));
        assert_eq!(view.departure, None);
        assert_eq!(view.row_class(), "anchor-to");
    }

    #[test]
    fn trip_view_keeps_schedule_order() {
        let record = crate::domain::TripRecord {
            trip: Trip {
                id: TripId(1),
                route_id: RouteId(1),
                info: TripInfo {
                    name: "Night Rider".into(),
                    category: BusCategory::LimitedStop,
                    ..TripInfo::default()
                },
                created_at: None,
            },
            route: None,
            stops: vec![stop(2, "Kozhikode", "23:00", "23:05"), stop(1, "Kannur", "", "22:00")],
        };
        let view = TripView::from_schedule(&TripSchedule::from_record(record).unwrap());
        assert_eq!(view.header.category, "Limited Stop");
        assert_eq!(view.stops[0].station_name, "Kannur");
        assert_eq!(view.stops[1].station_name, "Kozhikode");
    }

    #[test]
    fn route_view_formats_date() {
        let route = Route {
            id: RouteId(7),
            from_location: "Thrissur".into(),
            to_location: "Kochi".into(),
            created_at: "2024-05-01T10:00:00Z".parse().ok(),
        };
        let view = RouteView::from_route(&route);
        assert_eq!(view.title, "Thrissur → Kochi");
        assert_eq!(view.added.as_deref(), Some("1 May 2024"));
    }

    #[test]
    fn station_label_includes_location() {
        let view = StationView {
            id: "1".into(),
            name: "Kannur".into(),
            location: Some("Kannur Town".into()),
        };
        assert_eq!(view.label(), "Kannur (Kannur Town)");
    }

    #[test]
    fn trip_form_marks_selections() {
        let mut draft = TripDraft::new()
            .apply(DraftCommand::UpdateStopField(1, StopField::Station("4".into())));
        draft.category = "ksrtc".into();

        let form = TripFormView::from_draft(&draft);
        let selected: Vec<&str> = form
            .categories
            .iter()
            .filter(|c| c.selected)
            .map(|c| c.value)
            .collect();
        assert_eq!(selected, vec!["ksrtc"]);

        let station = StationView {
            id: "4".into(),
            name: "Malappuram".into(),
            location: None,
        };
        assert!(!form.stops[0].selects(&station));
        assert!(form.stops[1].selects(&station));
        assert_eq!(form.stops[1].sequence, 2);
    }

    #[test]
    fn popular_routes_listed() {
        let routes = popular_routes();
        assert_eq!(routes.len(), 6);
        assert_eq!(routes[0].from, "Kozhikode");
    }
}
