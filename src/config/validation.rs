//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that credentials needed at request time are present
//! - Validate value ranges (threshold in [0, 1], timeouts > 0)
//! - Detect unreachable routes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::schema::{GatewayConfig, RouteHandler};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("CASTLE_API_SECRET not provided")]
    MissingApiSecret,

    #[error("risk threshold must be a number in [0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("scoring url '{url}' is invalid: {reason}")]
    InvalidScoringUrl { url: String, reason: String },

    #[error("route '{route}': invalid method '{method}'")]
    InvalidMethod { route: String, method: String },

    #[error("route '{route}': pathname '{pathname}' must start with '/'")]
    InvalidPathname { route: String, pathname: String },

    #[error("route '{route}': authenticate handlers need an event")]
    MissingEvent { route: String },

    #[error("route '{route}' is unreachable, {method} {pathname} is already declared")]
    DuplicateRoute {
        route: String,
        method: String,
        pathname: String,
    },

    #[error("route '{route}': CASTLE_APP_ID not provided")]
    MissingAppId { route: String },
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let scoring = &config.scoring;

    match &scoring.api_secret {
        Some(secret) if !secret.expose_secret().is_empty() => {}
        _ => errors.push(ValidationError::MissingApiSecret),
    }

    if !(0.0..=1.0).contains(&scoring.risk_threshold) {
        errors.push(ValidationError::InvalidThreshold(scoring.risk_threshold));
    }

    if scoring.timeout_ms == 0 {
        errors.push(ValidationError::ZeroValue("scoring.timeout_ms"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.request_secs"));
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroValue("security.max_body_size"));
    }

    match url::Url::parse(&scoring.url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::InvalidScoringUrl {
            url: scoring.url.clone(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError::InvalidScoringUrl {
            url: scoring.url.clone(),
            reason: e.to_string(),
        }),
    }

    let mut seen = HashSet::new();
    for route in &config.routes {
        let name = route.display_name();

        if !is_method_token(&route.method) {
            errors.push(ValidationError::InvalidMethod {
                route: name.clone(),
                method: route.method.clone(),
            });
        }

        if !route.pathname.starts_with('/') {
            errors.push(ValidationError::InvalidPathname {
                route: name.clone(),
                pathname: route.pathname.clone(),
            });
        }

        match route.handler {
            RouteHandler::AuthenticateForm | RouteHandler::AuthenticateHeaders => {
                if route.event.as_deref().map_or(true, str::is_empty) {
                    errors.push(ValidationError::MissingEvent { route: name.clone() });
                }
            }
            RouteHandler::DemoPage => {
                if scoring.app_id.as_deref().map_or(true, str::is_empty) {
                    errors.push(ValidationError::MissingAppId { route: name.clone() });
                }
            }
        }

        if !seen.insert((route.method.as_str(), route.pathname.as_str())) {
            errors.push(ValidationError::DuplicateRoute {
                route: name,
                method: route.method.clone(),
                pathname: route.pathname.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_method_token(method: &str) -> bool {
    !method.is_empty() && method.bytes().all(|b| b.is_ascii_uppercase() || b == b'-')
}
