//! `facility-core` -- client-side state logic for the facility dashboards.
//!
//! Everything in this crate is synchronous and free of network I/O. The
//! gateway crate performs requests; the client crate drives these state
//! machines with the responses.

pub mod baseline;
pub mod card_order;
pub mod cascade;
pub mod cooldown;
pub mod csv;
pub mod display;
pub mod error;
pub mod filter;
pub mod form;
pub mod list_state;
pub mod models;
pub mod notice;
pub mod persist;
pub mod query;
pub mod resources;
pub mod selection;
pub mod sequence;
pub mod types;
