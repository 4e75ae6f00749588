use std::sync::Arc;

use crate::clock::Clock;
use crate::gate::LeadGate;

// app's shared state
pub struct AppState {
    pub gate: LeadGate,
    pub clock: Arc<dyn Clock>, // where "now" comes from
}

impl AppState {
    pub fn new(gate: LeadGate, clock: Arc<dyn Clock>) -> Self {
        Self { gate, clock }
    }
}
