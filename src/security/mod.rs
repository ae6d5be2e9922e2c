//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → Routing
//!     → Matched: limits.rs (check request body size) → buffer
//!
//! Outgoing scoring call:
//!     → headers.rs (scrub sensitive header values)
//! ```
//!
//! # Design Decisions
//! - Credentials and cookies never leave the gateway
//! - No trust in client input

pub mod headers;
pub mod limits;

pub use headers::{scrub, ScrubbedHeaders, ScrubbedValue, SensitiveHeaders};
