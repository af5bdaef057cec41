//! Async controllers that drive the `facility_core` state machines against a
//! [`Gateway`](facility_gateway::Gateway).
//!
//! Each controller is owned by one view and takes `&mut self`; the only
//! suspension points are gateway calls.

pub mod card_panel;
pub mod cascade_controller;
pub mod export;
pub mod form_controller;
pub mod list_controller;

pub use card_panel::CardPanel;
pub use cascade_controller::{CascadeController, LocalOptionLoader, OptionLoader, RemoteOptionLoader};
pub use form_controller::{FormController, SubmitBehavior, SubmitOutcome};
pub use list_controller::{EntityListController, FetchResult, PendingFetch};
