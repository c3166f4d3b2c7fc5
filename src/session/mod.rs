//! Dashboard Session
//!
//! Holds what the user has selected and the summary loaded for it.
//!
//! Filter changes may overlap: a slow response for an old selection can
//! arrive after a fast one for the new selection. Every fetch is tagged with
//! a [`RequestTicket`] and only the latest ticket may commit its result.

mod dashboard;
mod sequencer;

pub use dashboard::{DashboardSession, DashboardView, Selection, GLOBAL_REGION};
pub use sequencer::{RequestSequencer, RequestTicket};
