//! Risk-scoring service client.
//!
//! # Responsibilities
//! - POST the payload to the authenticate endpoint with Basic auth
//! - Enforce a deadline on the whole exchange
//! - Turn every failure into a typed [`ScoringError`]
//!
//! # Design Decisions
//! - Exactly one attempt; no retries
//! - The HTTP client is built once and shared (connection pooling)
//! - Dropping the future of [`ScoringClient::score`] aborts the request

use std::time::{Duration, Instant};

use base64ct::{Base64, Encoding};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use tokio::time::timeout;

use crate::config::schema::ScoringConfig;
use crate::observability::metrics;
use crate::scoring::payload::ScoringRequestPayload;
use crate::scoring::types::{ScoringError, ScoringResult, ScoringVerdict};

/// `Basic` authorization value for the API secret: empty user name, secret
/// as password.
pub fn basic_authorization(secret: &SecretString) -> SecretString {
    let credentials = format!(":{}", secret.expose_secret());
    SecretString::from(format!("Basic {}", Base64::encode_string(credentials.as_bytes())))
}

/// Client for the authenticate endpoint.
#[derive(Clone)]
pub struct ScoringClient {
    http: reqwest::Client,
    url: String,
    authorization: SecretString,
    timeout_ms: u64,
}

impl std::fmt::Debug for ScoringClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoringClient")
            .field("url", &self.url)
            .field("timeout_ms", &self.timeout_ms)
            .finish_non_exhaustive()
    }
}

impl ScoringClient {
    /// Create a client for `config`, authenticating with `secret`.
    ///
    /// Fails only when the underlying HTTP client cannot be built (TLS
    /// backend, proxy settings); that is a startup error, not a scoring one.
    pub fn new(config: &ScoringConfig, secret: &SecretString) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            url: config.url.clone(),
            authorization: basic_authorization(secret),
            timeout_ms: config.timeout_ms,
        })
    }

    /// Send `payload` and parse the verdict.
    pub async fn score(&self, payload: &ScoringRequestPayload) -> ScoringResult<ScoringVerdict> {
        let started = Instant::now();

        let result = match timeout(Duration::from_millis(self.timeout_ms), self.send(payload)).await {
            Ok(result) => result,
            Err(_) => Err(ScoringError::Timeout(self.timeout_ms)),
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        metrics::record_scoring_call(outcome, started);

        result
    }

    async fn send(&self, payload: &ScoringRequestPayload) -> ScoringResult<ScoringVerdict> {
        let response = self
            .http
            .post(&self.url)
            .header(AUTHORIZATION, self.authorization.expose_secret())
            .header(CONTENT_TYPE, "application/json")
            .json(payload)
            .send()
            .await
            .map_err(ScoringError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScoringError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(ScoringError::Transport)?;
        ScoringVerdict::from_slice(&body)
    }
}
