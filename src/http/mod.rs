//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID assigned, request span opened)
//!     → [controller router matches an action]
//!     → [action filter pipeline wraps the handler]
//!     → request ID copied onto the response
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::{make_request_span, X_REQUEST_ID};
pub use server::HttpServer;
