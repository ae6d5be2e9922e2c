//! Threshold policy.

use axum::http::StatusCode;

use crate::config::schema::FailurePolicy;
use crate::scoring::types::ScoringVerdict;

/// Final verdict for the original request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn status(&self) -> StatusCode {
        match self {
            Decision::Allow => StatusCode::OK,
            Decision::Deny => StatusCode::FORBIDDEN,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Deny => "deny",
        }
    }
}

/// Deny iff `risk > threshold`. The boundary itself is allowed.
pub fn decide_risk(risk: f64, threshold: f64) -> Decision {
    if risk > threshold {
        Decision::Deny
    } else {
        Decision::Allow
    }
}

pub fn decide(verdict: &ScoringVerdict, threshold: f64) -> Decision {
    decide_risk(verdict.risk(), threshold)
}

impl FailurePolicy {
    /// Decision used when no verdict is available.
    pub fn decision(&self) -> Decision {
        match self {
            FailurePolicy::FailClosed => Decision::Deny,
            FailurePolicy::FailOpen => Decision::Allow,
        }
    }
}
