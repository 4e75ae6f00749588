//! Lead admission gate.
//!
//! Decides, per submission, whether a lead is accepted. The order is fixed:
//! prune the origin's window, refuse if it is full, parse, validate, and only
//! then record the attempt. The origin's window stays locked for the whole
//! sequence, so concurrent submissions from one origin cannot overshoot the
//! limit.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::error::ValidationError;
use crate::models::{Lead, LeadSubmission};
use crate::rate_limit::{AttemptLog, RateLimitPolicy};

const MIN_FIELD_LEN: usize = 2;

lazy_static! {
    // Structural check only: something@something.something, no spaces, one @
    static ref EMAIL: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Accepted(Lead),
    RateLimited,
    MalformedBody(String),
    ValidationFailed(ValidationError),
}

impl Decision {
    // Label used for logs and the decisions metric
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Accepted(_) => "accepted",
            Decision::RateLimited => "rate_limited",
            Decision::MalformedBody(_) => "malformed_body",
            Decision::ValidationFailed(_) => "validation_failed",
        }
    }
}

pub struct LeadGate {
    log: Arc<AttemptLog>,
}

impl LeadGate {
    pub fn new(log: Arc<AttemptLog>) -> Self {
        Self { log }
    }

    pub fn with_policy(policy: RateLimitPolicy) -> Self {
        Self::new(Arc::new(AttemptLog::new(policy)))
    }

    pub fn log(&self) -> &Arc<AttemptLog> {
        &self.log
    }

    pub fn evaluate(&self, origin: &str, raw_body: &[u8], now: i64) -> Decision {
        let mut window = self.log.window(origin, now);

        if window.is_full() {
            return Decision::RateLimited;
        }

        let submission = match parse(raw_body) {
            Ok(submission) => submission,
            Err(reason) => return Decision::MalformedBody(reason),
        };

        let lead = match validate(submission) {
            Ok(lead) => lead,
            Err(e) => return Decision::ValidationFailed(e),
        };

        window.record(now);
        Decision::Accepted(lead)
    }
}

/// Decode the body as a JSON object. Repeated keys keep their last value.
pub fn parse(raw_body: &[u8]) -> Result<LeadSubmission, String> {
    let fields: Map<String, Value> =
        serde_json::from_slice(raw_body).map_err(|e| e.to_string())?;
    LeadSubmission::try_from(fields)
}

pub fn validate(submission: LeadSubmission) -> Result<Lead, ValidationError> {
    let name = trimmed(submission.name);
    let email = trimmed(submission.email);
    let company = trimmed(submission.company);

    if form_len(&name) < MIN_FIELD_LEN {
        return Err(ValidationError::NameTooShort);
    }
    if form_len(&company) < MIN_FIELD_LEN {
        return Err(ValidationError::CompanyTooShort);
    }
    if !EMAIL.is_match(&email) {
        return Err(ValidationError::InvalidEmail);
    }

    Ok(Lead {
        name,
        email,
        company,
    })
}

// Length as the browser form counts it, in UTF-16 code units
fn form_len(field: &str) -> usize {
    field.encode_utf16().count()
}

// Strips a stray BOM along with whitespace
fn trimmed(field: Option<String>) -> String {
    field
        .as_deref()
        .map(|f| f.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}'))
        .unwrap_or_default()
        .to_string()
}
