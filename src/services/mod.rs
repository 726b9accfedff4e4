//! Service registry subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     ServiceCollection::new()
//!     → add_singleton / add_transient / add_logger
//!     → build() → Arc<ServiceProvider> (immutable)
//!
//! Per request:
//!     filter factory asks provider.get_required::<T>()
//!     → singleton: clone of the stored Arc
//!     → transient: factory invoked, fresh Arc
//!     → missing: ResolveError::NotRegistered
//! ```
//!
//! # Design Decisions
//! - Keys are `type_name::<T>()` so `dyn Trait` can be a key
//! - Factories receive the provider to resolve their own dependencies
//! - No scopes: services are either per-resolution or process-wide

pub mod provider;

pub use provider::{ResolveError, ServiceCollection, ServiceProvider};
