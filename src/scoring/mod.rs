//! Risk-scoring subsystem.
//!
//! # Data Flow
//! ```text
//! IncomingRequest + event + client id
//!     → payload.rs (context, scrubbed headers, user data, timestamps)
//!     → client.rs (single POST with Basic auth and deadline)
//!     → types.rs (ScoringVerdict | ScoringError)
//! ```

pub mod client;
pub mod payload;
pub mod types;

pub use client::ScoringClient;
pub use payload::{PayloadBuilder, PayloadError, ScoringContext, ScoringRequestPayload};
pub use types::{ScoringError, ScoringResult, ScoringVerdict};
