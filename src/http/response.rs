//! Response mapping.
//!
//! # Responsibilities
//! - Turn a gateway [`Outcome`] into the response for the original caller
//! - Map gateway errors to appropriate HTTP status codes
//!
//! # Design Decisions
//! - Verdicts are echoed as JSON; the status carries the decision
//! - Fallthrough and error bodies are plain text
//! - Error bodies never include secrets or upstream details

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::gateway::{GatewayError, Outcome};
use crate::http::request::BodyReadError;

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        match self {
            Outcome::Unmatched(body) => (StatusCode::OK, body).into_response(),
            Outcome::Page(html) => Html(html).into_response(),
            Outcome::Allowed(verdict) => (StatusCode::OK, Json(verdict.into_document())).into_response(),
            Outcome::Denied(verdict) => {
                (StatusCode::FORBIDDEN, Json(verdict.into_document())).into_response()
            }
            Outcome::ScoringFailed { decision, error } => (
                decision.status(),
                Json(json!({
                    "error": "scoring_unavailable",
                    "reason": error.kind(),
                })),
            )
                .into_response(),
            Outcome::Rejected(error) => error.into_response(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            GatewayError::Config(_) | GatewayError::ClientBuild(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Gateway misconfigured").into_response()
            }
            GatewayError::MalformedClientJson(e) => {
                (StatusCode::BAD_REQUEST, e.to_string()).into_response()
            }
            GatewayError::ScoringUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "Scoring unavailable").into_response()
            }
        }
    }
}

impl IntoResponse for BodyReadError {
    fn into_response(self) -> Response {
        match self {
            BodyReadError::TooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response()
            }
            BodyReadError::Read(_) => {
                (StatusCode::BAD_REQUEST, "Failed to read request body").into_response()
            }
        }
    }
}
