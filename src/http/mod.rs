//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, buffer into IncomingRequest)
//!     → [gateway scores and decides]
//!     → response.rs (outcome → status + body)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{HeaderList, IncomingRequest, UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
