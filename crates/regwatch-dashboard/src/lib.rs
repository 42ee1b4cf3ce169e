//! Dashboard layer: an explicit refresh state machine and the controller that
//! drives fetch-then-analyse cycles through it.

mod controller;
pub mod state;

pub use controller::{DashboardController, REFRESH_CANCELLED, RefreshOutcome};
pub use state::{DashboardSnapshot, DashboardState, Phase, TransitionError};
