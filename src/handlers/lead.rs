use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;

use crate::gate::Decision;
use crate::metrics::{EVALUATION_LATENCY, LEAD_DECISIONS, LEAD_REQUESTS_TOTAL};
use crate::models::LeadResponse;
use crate::state::AppState;

const FORWARDED_FOR: &str = "x-forwarded-for";
const UNKNOWN_ORIGIN: &str = "unknown";

// The landing page only ships Portuguese error copy, whatever the locale
const MSG_RATE_LIMITED: &str = "Muitas tentativas. Aguarde um minuto e tente novamente.";
const MSG_MALFORMED: &str = "Corpo da requisição inválido.";
const MSG_INVALID: &str =
    "Revise os dados: nome, e-mail corporativo e empresa são obrigatórios.";
const MSG_ACCEPTED: &str = "Lead recebido com sucesso.";

/// Origin key for rate limiting: first `x-forwarded-for` hop, trimmed.
pub fn origin_key(headers: &HeaderMap) -> String {
    headers
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or(UNKNOWN_ORIGIN)
        .to_string()
}

impl IntoResponse for Decision {
    fn into_response(self) -> Response {
        let (status, message, data) = match self {
            Decision::Accepted(lead) => (StatusCode::OK, MSG_ACCEPTED, Some(lead)),
            Decision::RateLimited => (StatusCode::TOO_MANY_REQUESTS, MSG_RATE_LIMITED, None),
            Decision::MalformedBody(_) => (StatusCode::BAD_REQUEST, MSG_MALFORMED, None),
            Decision::ValidationFailed(_) => (StatusCode::UNPROCESSABLE_ENTITY, MSG_INVALID, None),
        };

        let body = LeadResponse {
            message: message.to_string(),
            data,
        };
        (status, Json(body)).into_response()
    }
}

pub async fn lead_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    LEAD_REQUESTS_TOTAL.inc();
    let start_time = Instant::now();

    let origin = origin_key(&headers);
    let decision = state.gate.evaluate(&origin, &body, state.clock.now_ms());

    EVALUATION_LATENCY.observe(start_time.elapsed().as_secs_f64());
    LEAD_DECISIONS.with_label_values(&[decision.label()]).inc();

    match &decision {
        Decision::Accepted(lead) => {
            tracing::info!(origin = %origin, company = %lead.company, "Lead accepted")
        }
        Decision::RateLimited => tracing::warn!(origin = %origin, "Lead rate limited"),
        Decision::MalformedBody(reason) => {
            tracing::debug!(origin = %origin, reason = %reason, "Malformed lead body")
        }
        Decision::ValidationFailed(e) => {
            tracing::debug!(origin = %origin, reason = %e, "Lead failed validation")
        }
    }

    decision.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn forwarded(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn takes_first_forwarded_hop() {
        assert_eq!(origin_key(&forwarded("203.0.113.7, 10.0.0.1")), "203.0.113.7");
        assert_eq!(origin_key(&forwarded("  198.51.100.2  ")), "198.51.100.2");
    }

    #[test]
    fn falls_back_to_unknown() {
        assert_eq!(origin_key(&HeaderMap::new()), "unknown");
        assert_eq!(origin_key(&forwarded("")), "unknown");
        assert_eq!(origin_key(&forwarded(" , 10.0.0.1")), "unknown");
    }

    #[test]
    fn maps_decisions_to_status_codes() {
        assert_eq!(Decision::RateLimited.into_response().status(), 429);
        assert_eq!(
            Decision::MalformedBody("eof".into()).into_response().status(),
            400
        );
        assert_eq!(
            Decision::ValidationFailed(crate::error::ValidationError::InvalidEmail)
                .into_response()
                .status(),
            422
        );
    }
}
