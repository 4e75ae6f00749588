//! Lead capture gateway for the landing page contact form.
//!
//! One POST endpoint (`/api/lead`) sits behind a per-origin sliding-window
//! rate limit and basic field validation. Accepted leads are echoed back and
//! not stored.

pub mod clock;
pub mod config;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod server;
pub mod state;

pub use gate::{Decision, LeadGate};
pub use state::AppState;
