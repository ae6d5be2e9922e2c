//! Edge risk gateway library.
//!
//! Intercepts authentication requests, scores them with an external
//! risk-scoring service and turns the verdict into allow/deny.

// Core subsystems
pub mod config;
pub mod gateway;
pub mod http;
pub mod routing;
pub mod scoring;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::GatewayConfig;
pub use gateway::{Decision, GatewayError, Outcome, RiskGateway};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
