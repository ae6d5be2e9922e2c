//! Scoring verdict and error definitions.

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while obtaining a verdict.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// Connection or request failed.
    #[error("scoring request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// No complete response within the deadline.
    #[error("scoring request timed out after {0} ms")]
    Timeout(u64),

    /// The service answered with a non-2xx status.
    #[error("scoring service returned status {0}")]
    Status(u16),

    /// The response body is not a usable verdict.
    #[error("invalid scoring response: {0}")]
    Decode(String),
}

impl ScoringError {
    /// Short label for logs, metrics and response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ScoringError::Transport(_) => "transport",
            ScoringError::Timeout(_) => "timeout",
            ScoringError::Status(_) => "status",
            ScoringError::Decode(_) => "decode",
        }
    }
}

/// Result type for scoring operations.
pub type ScoringResult<T> = Result<T, ScoringError>;

/// Parsed scoring response.
///
/// Keeps the whole document, in upstream key order, so it can be echoed
/// back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringVerdict {
    risk: f64,
    document: Value,
}

impl ScoringVerdict {
    /// Parse a response body. The document must be a JSON object with a
    /// numeric `risk` field.
    pub fn from_slice(body: &[u8]) -> ScoringResult<Self> {
        let document: Value =
            serde_json::from_slice(body).map_err(|e| ScoringError::Decode(e.to_string()))?;
        Self::from_value(document)
    }

    pub fn from_value(document: Value) -> ScoringResult<Self> {
        let risk = document
            .get("risk")
            .ok_or_else(|| ScoringError::Decode("missing risk field".to_string()))?
            .as_f64()
            .ok_or_else(|| ScoringError::Decode("risk is not a number".to_string()))?;

        if !(0.0..=1.0).contains(&risk) {
            tracing::warn!(risk, "Risk score outside [0, 1]");
        }

        Ok(Self { risk, document })
    }

    pub fn risk(&self) -> f64 {
        self.risk
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn into_document(self) -> Value {
        self.document
    }
}
