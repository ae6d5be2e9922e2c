//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up matching route for request
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in declaration order, first match wins
//! - Explicit NoMatch rather than silent default

use serde::Deserialize;

use crate::config::schema::RouteConfig;
use crate::routing::matcher::{AndMatcher, Matcher, MethodMatcher, PathMatcher, RequestTarget};

/// Handler bound to a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteHandler {
    /// Score the request, client id taken from a form-encoded body.
    AuthenticateForm,
    /// Score the request, client id and user data taken from headers.
    AuthenticateHeaders,
    /// Serve the sign-up demo page.
    DemoPage,
}

/// Where an authenticate handler reads its signals from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthVariant {
    Form,
    Headers,
}

impl RouteHandler {
    /// The authenticate variant, or `None` for non-scoring handlers.
    pub fn auth_variant(&self) -> Option<AuthVariant> {
        match self {
            RouteHandler::AuthenticateForm => Some(AuthVariant::Form),
            RouteHandler::AuthenticateHeaders => Some(AuthVariant::Headers),
            RouteHandler::DemoPage => None,
        }
    }
}

/// A compiled route.
#[derive(Debug)]
pub struct Route {
    pub name: String,
    pub method: String,
    pub pathname: String,
    pub event: Option<String>,
    pub handler: RouteHandler,
    matcher: AndMatcher,
}

impl Route {
    pub fn compile(config: &RouteConfig) -> Self {
        let matcher = AndMatcher::new(vec![
            Box::new(MethodMatcher::new(config.method.clone())),
            Box::new(PathMatcher::new(config.pathname.clone())),
        ]);

        Self {
            name: config.display_name(),
            method: config.method.clone(),
            pathname: config.pathname.clone(),
            event: config.event.clone(),
            handler: config.handler,
            matcher,
        }
    }

    pub fn matches(&self, target: &RequestTarget<'_>) -> bool {
        self.matcher.matches(target)
    }
}

/// The route table.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Compile routes, keeping declaration order.
    pub fn from_config(routes: &[RouteConfig]) -> Self {
        Self {
            routes: routes.iter().map(Route::compile).collect(),
        }
    }

    /// First route matching `method` and `path`, if any.
    pub fn match_request(&self, method: &str, path: &str) -> Option<&Route> {
        let target = RequestTarget::new(method, path);
        self.routes.iter().find(|route| route.matches(&target))
    }

    /// First route with the given handler.
    pub fn find_handler(&self, handler: RouteHandler) -> Option<&Route> {
        self.routes.iter().find(|route| route.handler == handler)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
