//! Request size limits.
//!
//! # Responsibilities
//! - Bound the bodies buffered for matched routes
//!
//! # Design Decisions
//! - Login and sign-up forms are small; the default limit is 64 KiB
//! - Enforced per matched route, never on the fallthrough path
//! - A declared `Content-Length` over the limit is rejected before reading;
//!   chunked bodies are counted while buffering

use axum::http::{header::CONTENT_LENGTH, HeaderMap};

pub const DEFAULT_MAX_BODY_SIZE: usize = 64 * 1024;

/// Whether the declared `Content-Length` is over `limit`.
///
/// A missing or unparsable header is left to the streaming check.
pub fn declared_length_exceeds(headers: &HeaderMap, limit: usize) -> bool {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .is_some_and(|length| length > limit as u64)
}
