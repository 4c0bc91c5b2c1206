//! Bus timings directory server.
//!
//! A web application for finding buses between Kerala towns. Travellers
//! search by station name fragments and contributors add stations and
//! bus trips with their stop timings.

pub mod authoring;
pub mod config;
pub mod domain;
pub mod registry;
pub mod search;
pub mod stations;
pub mod store;
pub mod web;
