//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Filters and handlers produce:
//!     → Logger<C> (typed category, structured log events)
//!     → tower-http TraceLayer (per-request spans)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, pretty or JSON)
//!     → capture.rs layer (in-memory, for assertions; `test_utils` feature)
//! ```
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Log level from config, overridden by RUST_LOG
//! - Request ID is attached as a span field by the HTTP layer

#[cfg(any(test, feature = "test_utils"))]
pub mod capture;
pub mod logging;

#[cfg(any(test, feature = "test_utils"))]
pub use capture::{CaptureLayer, CapturedEvent, CapturedLogs};
pub use logging::{init_logging, Logger};
