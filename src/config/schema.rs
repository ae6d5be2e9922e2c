//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.
//! The API secret is never read from a file; it only arrives through the
//! environment or the command line (see `config::loader`).

use secrecy::SecretString;
use serde::Deserialize;

pub use crate::routing::router::RouteHandler;

/// Default Castle authenticate endpoint, risk included in the response.
pub const DEFAULT_SCORING_URL: &str = "https://api.castle.io/v1/authenticate?include=risk";

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Route table, matched in declaration order.
    pub routes: Vec<RouteConfig>,

    /// Risk-scoring service settings.
    pub scoring: ScoringConfig,

    /// Inbound timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request hardening.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Plain-text body returned for requests that match no route.
    pub default_response: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            routes: default_routes(),
            scoring: ScoringConfig::default(),
            timeouts: TimeoutConfig::default(),
            security: SecurityConfig::default(),
            observability: ObservabilityConfig::default(),
            default_response: "OK".to_string(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// A single entry of the route table.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    #[serde(default)]
    pub name: Option<String>,

    /// HTTP method, compared as an exact string.
    pub method: String,

    /// Request pathname, compared as an exact string.
    pub pathname: String,

    /// Scoring event label (e.g. `$registration`).
    #[serde(default)]
    pub event: Option<String>,

    /// What to do with a matched request.
    pub handler: RouteHandler,
}

impl RouteConfig {
    /// Convenience constructor used by defaults and tests.
    pub fn new(
        method: impl Into<String>,
        pathname: impl Into<String>,
        event: Option<&str>,
        handler: RouteHandler,
    ) -> Self {
        Self {
            name: None,
            method: method.into(),
            pathname: pathname.into(),
            event: event.map(str::to_string),
            handler,
        }
    }

    /// Name used in logs and metric labels.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{} {}", self.method, self.pathname),
        }
    }
}

fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig::new("GET", "/", None, RouteHandler::DemoPage),
        RouteConfig::new(
            "POST",
            "/users/sign_up",
            Some("$registration"),
            RouteHandler::AuthenticateForm,
        ),
        RouteConfig::new(
            "POST",
            "/users/sign_in",
            Some("$login.succeeded"),
            RouteHandler::AuthenticateHeaders,
        ),
    ]
}

/// What the gateway answers when the scoring service is unavailable.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Deny the request (403).
    #[default]
    FailClosed,
    /// Allow the request (200).
    FailOpen,
}

/// Risk-scoring service configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Authenticate endpoint URL.
    pub url: String,

    /// Shared API secret, used as the Basic-auth password.
    #[serde(skip)]
    pub api_secret: Option<SecretString>,

    /// Browser SDK application id, only needed by the demo page.
    pub app_id: Option<String>,

    /// Requests are denied when `risk > risk_threshold`.
    pub risk_threshold: f64,

    /// Deadline for the outbound call, send and body read included.
    pub timeout_ms: u64,

    /// Decision applied when no verdict could be obtained.
    pub failure_policy: FailurePolicy,

    /// Header names (case-insensitive) whose values are scrubbed.
    pub scrubbed_headers: Vec<String>,

    /// Honour HTTP(S)_PROXY / NO_PROXY from the environment.
    pub use_system_proxy: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SCORING_URL.to_string(),
            api_secret: None,
            app_id: None,
            risk_threshold: 0.9,
            timeout_ms: 3000,
            failure_policy: FailurePolicy::FailClosed,
            scrubbed_headers: vec!["cookie".to_string(), "authorization".to_string()],
            use_system_proxy: true,
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes buffered for a matched route.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: crate::security::limits::DEFAULT_MAX_BODY_SIZE,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.scoring.url, DEFAULT_SCORING_URL);
        assert_eq!(config.scoring.risk_threshold, 0.9);
        assert_eq!(config.scoring.failure_policy, FailurePolicy::FailClosed);
        assert!(config.scoring.api_secret.is_none());
        assert_eq!(config.default_response, "OK");
        assert_eq!(config.routes.len(), 3);
        assert_eq!(config.routes[1].pathname, "/users/sign_up");
        assert_eq!(config.routes[1].event.as_deref(), Some("$registration"));
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: GatewayConfig = toml::from_str(
            r#"
            default_response = "pass"

            [scoring]
            risk_threshold = 0.7
            failure_policy = "fail_open"

            [[routes]]
            method = "POST"
            pathname = "/login"
            event = "$login.succeeded"
            handler = "authenticate_headers"
            "#,
        )
        .unwrap();

        assert_eq!(config.default_response, "pass");
        assert_eq!(config.scoring.risk_threshold, 0.7);
        assert_eq!(config.scoring.failure_policy, FailurePolicy::FailOpen);
        // Unspecified fields keep their defaults
        assert_eq!(config.scoring.timeout_ms, 3000);
        assert_eq!(config.routes.len(), 1);
        assert_eq!(config.routes[0].handler, RouteHandler::AuthenticateHeaders);
        assert_eq!(config.routes[0].display_name(), "POST /login");
    }

    #[test]
    fn test_secret_is_not_read_from_file() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [scoring]
            api_secret = "from-file"
            "#,
        )
        .unwrap();
        assert!(config.scoring.api_secret.is_none());
    }
}
