//! Web layer for the bus timings directory.
//!
//! Server-rendered pages for searching trips, browsing routes and
//! contributing stations and trips, plus JSON for search and station
//! autocomplete.

mod dto;
mod forms;
mod routes;
mod state;
pub mod templates;

pub use dto::*;
pub use forms::{FormAction, decode_trip_form};
pub use routes::create_router;
pub use state::AppState;
pub use templates::*;
