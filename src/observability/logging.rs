//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global subscriber from configuration
//! - Provide [`Logger<C>`], a logging sink typed to its owner's category
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - Log level configurable via config and environment (RUST_LOG wins)

use std::fmt;
use std::marker::PhantomData;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::{LogFormat, ObservabilityConfig};

/// Error type for subscriber initialization.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    InvalidFilter(#[from] tracing_subscriber::filter::ParseError),

    #[error("failed to install subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Install the global tracing subscriber.
///
/// An unparseable `RUST_LOG` falls back to the configured filter and is
/// reported as a warning once the subscriber is live.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), LoggingError> {
    let env_value = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let (filter, rejected) = select_filter(env_value.as_deref(), &config.log_level)?;

    let registry = tracing_subscriber::registry().with(filter);
    match config.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init()?,
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init()?,
    }

    if let Some(rejected) = rejected {
        tracing::warn!(
            env = EnvFilter::DEFAULT_ENV,
            value = %rejected.value,
            error = %rejected.error,
            fallback = %config.log_level,
            "Ignoring invalid log filter from environment"
        );
    }

    Ok(())
}

/// An environment filter that failed to parse.
#[derive(Debug)]
struct RejectedFilter {
    value: String,
    error: tracing_subscriber::filter::ParseError,
}

/// Pick the environment filter when set and valid, the configured one otherwise.
fn select_filter(
    env_value: Option<&str>,
    configured: &str,
) -> Result<(EnvFilter, Option<RejectedFilter>), LoggingError> {
    let Some(value) = env_value.filter(|v| !v.trim().is_empty()) else {
        return Ok((EnvFilter::try_new(configured)?, None));
    };

    match EnvFilter::try_new(value) {
        Ok(filter) => Ok((filter, None)),
        Err(error) => Ok((
            EnvFilter::try_new(configured)?,
            Some(RejectedFilter {
                value: value.to_string(),
                error,
            }),
        )),
    }
}

/// A logging sink whose records carry the category of `C`.
///
/// Resolved from the service provider like any other dependency, so a
/// component can only log once its own `Logger<Self>` is registered.
pub struct Logger<C: ?Sized> {
    category: &'static str,
    _category: PhantomData<fn(&C)>,
}

impl<C: ?Sized + 'static> Logger<C> {
    pub fn new() -> Self {
        Self {
            category: std::any::type_name::<C>(),
            _category: PhantomData,
        }
    }

    /// Fully-qualified type name of the category.
    pub fn category(&self) -> &'static str {
        self.category
    }

    pub fn info(&self, message: &str) {
        tracing::info!(category = self.category, "{}", message);
    }
}

impl<C: ?Sized + 'static> Default for Logger<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ?Sized> Clone for Logger<C> {
    fn clone(&self) -> Self {
        Self {
            category: self.category,
            _category: PhantomData,
        }
    }
}

impl<C: ?Sized> fmt::Debug for Logger<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").field("category", &self.category).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::capture::CapturedLogs;
    use tracing::Level;

    struct Widget;

    #[test]
    fn test_select_filter_uses_valid_env_value() {
        let (filter, rejected) = select_filter(Some("debug"), "info").unwrap();
        assert!(rejected.is_none());
        assert_eq!(filter.to_string().to_lowercase(), "debug");
    }

    #[test]
    fn test_select_filter_rejects_invalid_env_value() {
        let (filter, rejected) = select_filter(Some("action_log=loud"), "warn").unwrap();
        let rejected = rejected.unwrap();
        assert_eq!(rejected.value, "action_log=loud");
        assert!(!rejected.error.to_string().is_empty());
        assert_eq!(filter.to_string().to_lowercase(), "warn");
    }

    #[test]
    fn test_select_filter_without_env_value() {
        let (filter, rejected) = select_filter(None, "warn").unwrap();
        assert!(rejected.is_none());
        assert_eq!(filter.to_string().to_lowercase(), "warn");

        let (_, rejected) = select_filter(Some("  "), "warn").unwrap();
        assert!(rejected.is_none());
    }

    #[test]
    fn test_select_filter_invalid_configured_value_is_an_error() {
        let err = select_filter(None, "action_log=loud").unwrap_err();
        assert!(matches!(err, LoggingError::InvalidFilter(_)));
    }

    #[test]
    fn test_logger_category_is_type_name() {
        let logger = Logger::<Widget>::new();
        assert!(logger.category().ends_with("Widget"));
    }

    #[test]
    fn test_logger_emits_with_category() {
        let logs = CapturedLogs::new();
        let _guard = logs.set_default();

        let logger = Logger::<Widget>::new();
        logger.info("widget ready");
        logger.info("widget wobbly");

        let events = logs.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].level, Level::INFO);
        assert_eq!(events[0].message, "widget ready");
        assert_eq!(events[0].category.as_deref(), Some(logger.category()));
        assert_eq!(events[1].message, "widget wobbly");
    }
}
