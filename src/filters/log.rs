//! Entry/exit logging for actions.
//!
//! Put [`LogAttribute`] on a controller or an action; every activation then
//! resolves a fresh [`LogActionFilter`] from the service provider, which logs
//! one record before and one after the action runs.

use std::sync::Arc;

use crate::filters::{ActionExecutedContext, ActionExecutingContext, ActionFilter, FilterFactory};
use crate::observability::Logger;
use crate::services::{ResolveError, ServiceCollection, ServiceProvider};

pub const EXECUTING_MESSAGE: &str = "Action is executing.";
pub const EXECUTED_MESSAGE: &str = "Action executed.";

/// Marker producing a [`LogActionFilter`] per activation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAttribute;

impl FilterFactory for LogAttribute {
    fn name(&self) -> &'static str {
        "LogAttribute"
    }

    fn is_reusable(&self) -> bool {
        false
    }

    fn create_instance(&self, services: &ServiceProvider) -> Result<Arc<dyn ActionFilter>, ResolveError> {
        let filter = services.get_required::<LogActionFilter>()?;
        Ok(filter)
    }
}

/// Logs a fixed message around each action.
#[derive(Debug)]
pub struct LogActionFilter {
    logger: Arc<Logger<LogActionFilter>>,
}

impl LogActionFilter {
    pub fn new(logger: Arc<Logger<LogActionFilter>>) -> Self {
        Self { logger }
    }

    /// Register the filter (transient) and its logger with `services`.
    pub fn register(services: &mut ServiceCollection) {
        services
            .add_logger::<LogActionFilter>()
            .add_transient::<LogActionFilter, _>(|sp| {
                let logger = sp.get_required::<Logger<LogActionFilter>>()?;
                Ok(Arc::new(LogActionFilter::new(logger)))
            });
    }
}

impl ActionFilter for LogActionFilter {
    fn on_action_executing(&self, _context: &ActionExecutingContext) {
        self.logger.info(EXECUTING_MESSAGE);
    }

    fn on_action_executed(&self, _context: &ActionExecutedContext) {
        self.logger.info(EXECUTED_MESSAGE);
    }
}
