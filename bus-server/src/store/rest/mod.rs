//! Store backed by a hosted relational database's REST API.

mod client;
mod types;

pub use client::{RestStore, RestStoreConfig};
