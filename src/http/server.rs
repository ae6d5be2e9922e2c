//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the gateway handler
//! - Wire up middleware (request ID, tracing, timeout)
//! - Bind server to listener
//! - Dispatch requests to the routing engine and the risk gateway
//! - Observability (metrics, correlation IDs)

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::gateway::{GatewayError, Outcome, RiskGateway};
use crate::http::request::{request_id, IncomingRequest, UuidRequestId};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<RiskGateway>,
    pub max_body_size: usize,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let gateway = Arc::new(RiskGateway::new(&config)?);

        tracing::info!(
            routes = gateway.router().len(),
            risk_threshold = gateway.risk_threshold(),
            "Gateway initialized"
        );

        let state = AppState {
            gateway,
            max_body_size: config.security.max_body_size,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Body limits are not a layer: they apply only once a route matched.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        Router::new()
            .fallback(gateway_handler)
            .with_state(state)
            .layer(middleware)
    }

    /// The Axum router, for serving on a custom transport or in tests.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main gateway handler.
/// Matches the route, buffers the body for matched routes and hands the
/// request to the risk gateway.
async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers());
    let method = request.method().as_str().to_string();
    let path = request.uri().path().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Handling request"
    );

    // 1. Match Route
    let route = match state.gateway.router().match_request(&method, &path) {
        Some(route) => route,
        None => {
            tracing::debug!(request_id = %request_id, path = %path, "No route matched");
            let response = state.gateway.fallthrough().into_response();
            metrics::record_request(&method, response.status().as_u16(), "none", start_time);
            return response;
        }
    };

    // 2. Buffer Request Body
    let incoming = match IncomingRequest::from_request(request, state.max_body_size).await {
        Ok(incoming) => incoming,
        Err(e) => {
            tracing::warn!(request_id = %request_id, route = %route.name, error = %e, "Rejecting request body");
            let response = e.into_response();
            metrics::record_request(&method, response.status().as_u16(), &route.name, start_time);
            return response;
        }
    };

    // 3. Score and decide
    let outcome: Outcome = state.gateway.handle(route, &incoming).await;
    tracing::info!(
        request_id = %request_id,
        route = %route.name,
        outcome = outcome.label(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Request handled"
    );

    let response = outcome.into_response();
    metrics::record_request(&method, response.status().as_u16(), &route.name, start_time);
    response
}
