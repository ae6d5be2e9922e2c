//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, pathname)
//!     → router.rs (route lookup)
//!     → matcher.rs (evaluate match conditions)
//!     → Return: matched Route or NoMatch
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → Compile matchers (exact method + exact pathname)
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Routes are plain data, testable without any handler logic
//! - Deterministic: same input always matches same route
//! - First match wins (declaration order)

pub mod matcher;
pub mod router;

pub use router::{AuthVariant, Route, RouteHandler, Router};
