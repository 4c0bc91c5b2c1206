//! HTTP route handlers.

use std::path::Path;

use askama::Template;
use axum::{
    Form, Json, Router,
    extract::{Path as UrlPath, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::authoring::{AuthoringError, TripDraft};
use crate::domain::{RouteFilter, RouteId};
use crate::registry::{self, RegistryError};
use crate::search::TripFinder;
use crate::stations::{DEFAULT_SUGGESTIONS, MAX_SUGGESTIONS, StationError};

use super::dto::*;
use super::forms::{FormAction, decode_trip_form};
use super::state::AppState;
use super::templates::*;

/// Create the application router.
///
/// `static_dir` is the path to the static assets directory.
pub fn create_router(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/health", get(health))
        .route("/search", get(search_trips))
        .route("/api/stations/search", get(search_stations))
        .route("/routes", get(routes_page))
        .route("/routes/:id", get(route_detail_page))
        .route("/stations", get(stations_page).post(add_station))
        .route("/trips/new", get(trip_form_page).post(submit_trip_form))
        .nest_service("/static", ServeDir::new(static_dir.as_ref()))
        .fallback(page_not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Index page with search form.
async fn index_page() -> IndexTemplate {
    IndexTemplate {
        popular: popular_routes(),
    }
}

async fn page_not_found() -> AppError {
    AppError::NotFound {
        message: "Page not found".to_string(),
    }
}

/// Check if request accepts HTML.
fn accepts_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

/// Search for trips between two station name fragments.
async fn search_trips(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(req): Query<TripSearchRequest>,
) -> Response {
    let matches = if req.is_complete() {
        TripFinder::new(state.store.as_ref(), &state.stations, state.search.as_ref())
            .find_trips(req.from.trim(), req.to.trim())
            .await
    } else {
        Vec::new()
    };

    // Return HTML or JSON based on Accept header
    if accepts_html(&headers) {
        SearchResultsTemplate {
            searched: req.is_complete(),
            trips: matches.iter().map(TripMatchView::from_match).collect(),
            from: req.from,
            to: req.to,
        }
        .into_response()
    } else {
        Json(TripSearchResponse {
            trips: matches.iter().map(TripMatchResult::from_match).collect(),
            from: req.from,
            to: req.to,
        })
        .into_response()
    }
}

/// Search stations by name, for autocomplete.
async fn search_stations(
    State(state): State<AppState>,
    Query(req): Query<StationSearchRequest>,
) -> Json<StationSearchResponse> {
    let limit = req.limit.unwrap_or(DEFAULT_SUGGESTIONS).min(MAX_SUGGESTIONS);
    let matches = state
        .stations
        .suggest(&req.q, limit)
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "station search failed");
            Vec::new()
        });

    Json(StationSearchResponse {
        stations: matches.into_iter().map(StationResult::from).collect(),
    })
}

/// All routes, optionally filtered by label.
async fn routes_page(
    State(state): State<AppState>,
    Query(req): Query<RouteListRequest>,
) -> RoutesTemplate {
    let clean = |s: Option<String>| s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    let filter = RouteFilter {
        from: clean(req.from),
        to: clean(req.to),
    };

    let routes = registry::list_routes(state.store.as_ref(), &filter).await;

    RoutesTemplate {
        routes: routes.iter().map(RouteView::from_route).collect(),
        from: filter.from.unwrap_or_default(),
        to: filter.to.unwrap_or_default(),
    }
}

/// One route with its trips.
async fn route_detail_page(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<String>,
) -> Result<RouteDetailTemplate, AppError> {
    let id: RouteId = id.parse().map_err(|_| AppError::NotFound {
        message: format!("No route with id {id:?}"),
    })?;

    let detail = registry::route_detail(state.store.as_ref(), id).await?;

    Ok(RouteDetailTemplate {
        route: RouteView::from_route(&detail.route),
        trips: detail.trips.iter().map(TripView::from_schedule).collect(),
    })
}

/// Stations for listings and select boxes, with a notice if they could not
/// be loaded.
async fn station_views(state: &AppState) -> (Vec<StationView>, Option<Notice>) {
    match state.stations.list_stations().await {
        Ok(stations) => (stations.iter().map(StationView::from_station).collect(), None),
        Err(e) => {
            error!(error = %e, "failed to list stations");
            (Vec::new(), Some(Notice::error("Error fetching stations")))
        }
    }
}

/// Station list and add-station form.
async fn stations_page(State(state): State<AppState>) -> StationsTemplate {
    let (stations, notice) = station_views(&state).await;
    StationsTemplate {
        stations,
        notice,
        name: String::new(),
        location: String::new(),
    }
}

/// Add a station.
async fn add_station(
    State(state): State<AppState>,
    Form(form): Form<AddStationForm>,
) -> (StatusCode, StationsTemplate) {
    let location = Some(form.location.as_str());
    let added = state
        .stations
        .add_station(&form.station_name, location)
        .await;

    let (status, notice, keep_input) = match added {
        Ok(_) => (StatusCode::OK, Notice::success("Station added successfully!"), false),
        Err(StationError::Validation(e)) => {
            (StatusCode::BAD_REQUEST, Notice::error(e.message()), true)
        }
        Err(e) => {
            error!(error = %e, "failed to add station");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Notice::error("Error adding station. Please try again."),
                true,
            )
        }
    };

    let (stations, list_notice) = station_views(&state).await;
    let (name, location) = if keep_input {
        (form.station_name, form.location)
    } else {
        (String::new(), String::new())
    };

    (
        status,
        StationsTemplate {
            stations,
            notice: list_notice.or(Some(notice)),
            name,
            location,
        },
    )
}

async fn render_trip_form(
    state: &AppState,
    status: StatusCode,
    draft: &TripDraft,
    notice: Option<Notice>,
) -> Response {
    let (stations, list_notice) = station_views(state).await;
    let template = TripFormTemplate {
        form: TripFormView::from_draft(draft),
        stations,
        notice: notice.or(list_notice),
    };
    (status, template).into_response()
}

/// Empty trip authoring form.
async fn trip_form_page(State(state): State<AppState>) -> Response {
    render_trip_form(&state, StatusCode::OK, &TripDraft::new(), None).await
}

/// Apply a stop-list edit, or validate and save the trip.
async fn submit_trip_form(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let (draft, action) = decode_trip_form(pairs);

    match action {
        FormAction::Edit(command) => {
            let draft = draft.apply(command);
            render_trip_form(&state, StatusCode::OK, &draft, None).await
        }
        FormAction::Submit => match state.author.create_trip(&draft).await {
            Ok(created) => Redirect::to(&format!("/routes/{}", created.route.id)).into_response(),
            Err(AuthoringError::Validation(e)) => {
                let notice = Notice::error(e.message());
                render_trip_form(&state, StatusCode::BAD_REQUEST, &draft, Some(notice)).await
            }
            Err(e) => {
                error!(error = %e, "failed to save trip");
                let notice = Notice::error("Error adding bus trip. Please try again.");
                render_trip_form(&state, StatusCode::INTERNAL_SERVER_ERROR, &draft, Some(notice))
                    .await
            }
        },
    }
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    NotFound { message: String },
    Internal { message: String },
}

impl From<RegistryError> for AppError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::NotFound(_) => AppError::NotFound {
                message: e.to_string(),
            },
            _ => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound { message } => {
                (StatusCode::NOT_FOUND, NotFoundTemplate { message }).into_response()
            }
            AppError::Internal { message } => {
                error!(%message, "internal error");
                let template = ErrorTemplate {
                    title: "Something went wrong".to_string(),
                    message: "Please try again later.".to_string(),
                };
                match template.render() {
                    Ok(html) => (StatusCode::INTERNAL_SERVER_ERROR, Html(html)).into_response(),
                    Err(e) => {
                        error!(error = %e, "failed to render error page");
                        let body = Json(ErrorResponse {
                            error: template.message,
                        });
                        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
                    }
                }
            }
        }
    }
}
