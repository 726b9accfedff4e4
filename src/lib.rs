//! Entry/exit logging for HTTP actions through declarative filter markers.
//!
//! A marker ([`filters::LogAttribute`]) placed on a controller or one of its
//! actions is resolved, per request, into a filter instance
//! ([`filters::LogActionFilter`]) from the [`services::ServiceProvider`].
//! The filter logs once before and once after the action runs.

pub mod config;
pub mod controllers;
pub mod filters;
pub mod http;
pub mod lifecycle;
pub mod mvc;
pub mod observability;
pub mod services;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
