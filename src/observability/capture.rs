//! In-memory log capture.
//!
//! A [`CaptureLayer`] records every event it sees into a shared buffer so
//! callers can assert on what was logged, and in which order.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// A single recorded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedEvent {
    pub level: Level,
    pub target: String,
    pub message: String,
    /// Value of the `category` field, if the event carried one.
    pub category: Option<String>,
}

/// Shared buffer of captured events.
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CapturedLogs {
    pub fn new() -> Self {
        Self::default()
    }

    /// A layer writing into this buffer.
    pub fn layer(&self) -> CaptureLayer {
        CaptureLayer {
            events: self.events.clone(),
        }
    }

    /// Capture events on the current thread until the guard drops.
    pub fn set_default(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::registry().with(self.layer());
        tracing::subscriber::set_default(subscriber)
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.message.clone()).collect()
    }

    /// Messages of events whose category ends with `suffix`.
    pub fn messages_for(&self, suffix: &str) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.category.as_deref().is_some_and(|c| c.ends_with(suffix)))
            .map(|e| e.message.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

/// Layer that appends events to a [`CapturedLogs`] buffer.
pub struct CaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        self.events.lock().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message: visitor.message.unwrap_or_default(),
            category: visitor.category,
        });
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    category: Option<String>,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = Some(value.to_string()),
            "category" => self.category = Some(value.to_string()),
            _ => {}
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = Some(format!("{:?}", value)),
            "category" => self.category = Some(format!("{:?}", value)),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captures_in_order() {
        let logs = CapturedLogs::new();
        let _guard = logs.set_default();

        tracing::info!("first");
        tracing::warn!(category = "demo::Thing", "second");

        assert_eq!(logs.messages(), vec!["first", "second"]);
        assert_eq!(logs.messages_for("Thing"), vec!["second"]);

        logs.clear();
        assert!(logs.events().is_empty());
    }
}
