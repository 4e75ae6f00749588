mod health;
mod lead;
mod metrics;

pub use health::health_handler;
pub use lead::{lead_handler, origin_key};
pub use metrics::metrics_handler;
