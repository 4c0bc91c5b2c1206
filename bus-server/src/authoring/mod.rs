//! Trip authoring: composing a trip in a draft and writing it.

mod author;
mod draft;
mod validate;

pub use author::{AuthoringError, CreatedTrip, TripAuthor};
pub use draft::{DraftCommand, INITIAL_STOPS, StopDraft, StopField, TripDraft};
pub use validate::{ValidatedStop, ValidatedTrip, validate};
