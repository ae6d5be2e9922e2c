//! Risk gateway.
//!
//! # Data Flow
//! ```text
//! Received
//!     → router (method, pathname)            → Unmatched → default response
//!     → Matched: demo page                   → Page
//!     → Matched: authenticate
//!         → extract.rs (client id)
//!         → scoring::payload (context, scrubbed headers)
//!         → scoring::client (one POST)       → ScoringFailed → failure policy
//!         → policy.rs (risk > threshold)     → Allowed | Denied
//! ```
//!
//! # Design Decisions
//! - Stateless: nothing survives the response
//! - At most one outbound call per request
//! - Every request ends in exactly one [`Outcome`]

pub mod demo;
pub mod extract;
pub mod policy;

use thiserror::Error;

use crate::config::schema::{FailurePolicy, GatewayConfig, ScoringConfig};
use crate::http::request::IncomingRequest;
use crate::observability::metrics;
use crate::routing::{AuthVariant, Route, RouteHandler, Router};
use crate::scoring::{PayloadBuilder, PayloadError, ScoringClient, ScoringError, ScoringVerdict};
use crate::security::headers::SensitiveHeaders;

pub use policy::{decide, Decision};

/// Errors produced while handling a matched request.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Required configuration is missing.
    #[error("configuration error: {0}")]
    Config(&'static str),

    /// The outbound HTTP client could not be built.
    #[error("failed to build scoring client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// Client-supplied JSON could not be parsed.
    #[error("malformed client input: {0}")]
    MalformedClientJson(#[from] PayloadError),

    /// No verdict could be obtained.
    #[error("scoring unavailable: {0}")]
    ScoringUnavailable(#[from] ScoringError),
}

/// Terminal state of a request.
#[derive(Debug)]
pub enum Outcome {
    /// No route matched; carries the default body.
    Unmatched(String),
    /// Demo page markup.
    Page(String),
    /// Scored at or below the threshold.
    Allowed(ScoringVerdict),
    /// Scored above the threshold.
    Denied(ScoringVerdict),
    /// No verdict; the failure policy decided.
    ScoringFailed {
        decision: Decision,
        error: ScoringError,
    },
    /// Rejected before any scoring call.
    Rejected(GatewayError),
}

impl Outcome {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Unmatched(_) => "unmatched",
            Outcome::Page(_) => "page",
            Outcome::Allowed(_) => "allowed",
            Outcome::Denied(_) => "denied",
            Outcome::ScoringFailed { .. } => "scoring_failed",
            Outcome::Rejected(_) => "rejected",
        }
    }
}

/// Route table, policy and scoring client, shared by all requests.
#[derive(Debug)]
pub struct RiskGateway {
    router: Router,
    payloads: PayloadBuilder,
    scoring: Option<ScoringClient>,
    risk_threshold: f64,
    failure_policy: FailurePolicy,
    app_id: Option<String>,
    default_response: String,
}

impl RiskGateway {
    /// Build the gateway. A missing API secret is not an error here; matched
    /// authenticate routes then answer with a configuration error.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let ScoringConfig {
            api_secret,
            app_id,
            risk_threshold,
            failure_policy,
            scrubbed_headers,
            ..
        } = &config.scoring;

        let scoring = api_secret
            .as_ref()
            .map(|secret| ScoringClient::new(&config.scoring, secret))
            .transpose()
            .map_err(GatewayError::ClientBuild)?;

        Ok(Self {
            router: Router::from_config(&config.routes),
            payloads: PayloadBuilder::new(SensitiveHeaders::new(scrubbed_headers)),
            scoring,
            risk_threshold: *risk_threshold,
            failure_policy: *failure_policy,
            app_id: app_id.clone(),
            default_response: config.default_response.clone(),
        })
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn risk_threshold(&self) -> f64 {
        self.risk_threshold
    }

    /// Outcome for requests that match no route.
    pub fn fallthrough(&self) -> Outcome {
        Outcome::Unmatched(self.default_response.clone())
    }

    /// Match and handle a buffered request.
    pub async fn dispatch(&self, request: &IncomingRequest) -> Outcome {
        match self.router.match_request(&request.method, &request.path) {
            Some(route) => self.handle(route, request).await,
            None => self.fallthrough(),
        }
    }

    /// Handle a request already matched to `route`.
    pub async fn handle(&self, route: &Route, request: &IncomingRequest) -> Outcome {
        let variant = match route.handler.auth_variant() {
            Some(variant) => variant,
            None => return self.demo_page(),
        };

        let event = route.event.as_deref().unwrap_or_default();
        match self.authenticate(event, variant, request).await {
            Ok(verdict) => {
                let decision = decide(&verdict, self.risk_threshold);
                metrics::record_decision(decision.as_str(), "verdict");
                tracing::info!(
                    route = %route.name,
                    event = %event,
                    risk = verdict.risk(),
                    threshold = self.risk_threshold,
                    decision = decision.as_str(),
                    "Request scored"
                );
                match decision {
                    Decision::Allow => Outcome::Allowed(verdict),
                    Decision::Deny => Outcome::Denied(verdict),
                }
            }
            Err(GatewayError::ScoringUnavailable(error)) => {
                let decision = self.failure_policy.decision();
                metrics::record_decision(decision.as_str(), "failure_policy");
                tracing::warn!(
                    route = %route.name,
                    event = %event,
                    error = %error,
                    kind = error.kind(),
                    decision = decision.as_str(),
                    "Scoring unavailable, applying failure policy"
                );
                Outcome::ScoringFailed { decision, error }
            }
            Err(error) => {
                tracing::warn!(route = %route.name, error = %error, "Request rejected");
                Outcome::Rejected(error)
            }
        }
    }

    /// Score `request` under `event`: one outbound call at most.
    pub async fn authenticate(
        &self,
        event: &str,
        variant: AuthVariant,
        request: &IncomingRequest,
    ) -> Result<ScoringVerdict, GatewayError> {
        let client = self
            .scoring
            .as_ref()
            .ok_or(GatewayError::Config("CASTLE_API_SECRET not provided"))?;

        let client_id = extract::extract_client_id(request, variant).await;
        if client_id.is_none() {
            tracing::debug!(event = %event, "No client id on request");
        }

        let payload = self.payloads.build(event, request, client_id, variant)?;
        Ok(client.score(&payload).await?)
    }

    fn demo_page(&self) -> Outcome {
        let Some(app_id) = self.app_id.as_deref().filter(|id| !id.is_empty()) else {
            return Outcome::Rejected(GatewayError::Config("CASTLE_APP_ID not provided"));
        };

        let form_action = self
            .router
            .find_handler(RouteHandler::AuthenticateForm)
            .map_or("/users/sign_up", |route| route.pathname.as_str());

        Outcome::Page(demo::render_demo_page(app_id, form_action))
    }
}
