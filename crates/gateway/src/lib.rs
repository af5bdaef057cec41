//! REST client for the facility backend.
//!
//! Builds `{base}/{resource}.json` URLs, maps typed filters to the backend's
//! `q[...]` query keys, attaches the bearer token from the session, and
//! parses list payloads into [`Page`](facility_core::list_state::Page)s.
//! Controllers depend on the [`Gateway`] trait rather than on the concrete
//! client.

pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod payload;
pub mod wire;

pub use client::GatewayClient;
pub use error::GatewayError;
pub use gateway::{Attachment, Gateway, MutationBody};
