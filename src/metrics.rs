use lazy_static::lazy_static;
use prometheus::{
    Histogram, IntCounter, IntCounterVec, IntGauge, register_histogram, register_int_counter,
    register_int_counter_vec, register_int_gauge,
};

lazy_static! {
    pub static ref LEAD_REQUESTS_TOTAL: IntCounter =
        register_int_counter!("lead_requests_total", "Total lead submissions received")
            .expect("lead_requests_total registers once");
    pub static ref LEAD_DECISIONS: IntCounterVec = register_int_counter_vec!(
        "lead_decisions_total",
        "Lead submissions by gate decision",
        &["decision"]
    )
    .expect("lead_decisions_total registers once");
    pub static ref EVALUATION_LATENCY: Histogram = register_histogram!(
        "lead_evaluation_seconds",
        "Time spent deciding on a lead submission"
    )
    .expect("lead_evaluation_seconds registers once");
    pub static ref TRACKED_ORIGINS: IntGauge = register_int_gauge!(
        "lead_tracked_origins",
        "Origins currently held in the attempt log"
    )
    .expect("lead_tracked_origins registers once");
}
