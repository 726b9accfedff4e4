//! Controller routing.
//!
//! # Data Flow
//! ```text
//! ControllerRoutes::new(name, base_path, provider)
//!     → .filter(marker)           controller scope, every action
//!     → .action(Action::new(..)   one route
//!          .filter(marker))       action scope, that route only
//!     → .into_router()
//!         → ActionDescriptor per action (controller markers first)
//!         → MethodRouter wrapped in ActionFilterLayer
//!         → axum Router
//! ```
//!
//! # Design Decisions
//! - Markers are collected first and applied at into_router, so
//!   controller-scope placement does not depend on call order
//! - Actions without markers are still wrapped; their descriptor is
//!   available to handlers through request extensions

pub mod routes;

pub use routes::{Action, ControllerRoutes};
