//! Action filter subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     marker (FilterFactory) placed on controller or action
//!     → mvc::ControllerRoutes collects it into the ActionDescriptor
//!     → pipeline.rs wraps the action's handler in ActionFilterLayer
//!
//! Per request:
//!     ActionFilterLayer
//!     → FilterFactory::create_instance(provider)   (every marker, in order)
//!     → ActionFilter::on_action_executing          (in order)
//!     → action handler
//!     → ActionFilter::on_action_executed           (reverse order)
//! ```
//!
//! # Design Decisions
//! - Markers are factories, never filters: the instance comes from the provider
//! - Non-reusable factories are asked on every activation
//! - Hooks see contexts by shared reference and cannot short-circuit
//! - Resolution failure aborts before any hook fires

pub mod context;
pub mod log;
pub mod pipeline;

use std::fmt;
use std::sync::Arc;

use crate::services::{ResolveError, ServiceProvider};

pub use context::{ActionDescriptor, ActionExecutedContext, ActionExecutingContext, FilterScope, ScopedFilter};
pub use log::{LogActionFilter, LogAttribute};
pub use pipeline::{run_filtered, ActionFilterChain, ActionFilterLayer, ActionFilterService, FilterError};

/// Hooks run around an action.
pub trait ActionFilter: Send + Sync {
    /// Called before the action handler runs.
    fn on_action_executing(&self, context: &ActionExecutingContext);

    /// Called after the action handler produced its response.
    fn on_action_executed(&self, context: &ActionExecutedContext);
}

/// Declarative marker that produces a filter when its action is activated.
pub trait FilterFactory: Send + Sync + fmt::Debug {
    /// Name reported in logs and error responses.
    fn name(&self) -> &'static str;

    /// Whether one instance may serve every activation of a route.
    fn is_reusable(&self) -> bool;

    fn create_instance(&self, services: &ServiceProvider) -> Result<Arc<dyn ActionFilter>, ResolveError>;
}
