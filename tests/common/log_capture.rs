//! In-memory tracing layer for asserting on library logs.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// One recorded event.
#[derive(Debug, Clone)]
pub struct CapturedLog {
    pub level: Level,
    pub message: String,
    pub fields: BTreeMap<String, String>,
}

/// Records every event on the current thread until dropped.
pub struct TestLogCapture {
    events: Arc<Mutex<Vec<CapturedLog>>>,
    _guard: tracing::subscriber::DefaultGuard,
}

impl TestLogCapture {
    pub fn start() -> Self {
        let events = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(Recorder {
            events: Arc::clone(&events),
        });
        Self {
            events,
            _guard: tracing::subscriber::set_default(subscriber),
        }
    }

    pub fn logs(&self) -> Vec<CapturedLog> {
        self.events().clone()
    }

    pub fn assert_logged(&self, needle: &str) {
        let events = self.events();
        assert!(
            events.iter().any(|e| e.message.contains(needle)),
            "no event mentions {needle:?}; messages: {:#?}",
            messages(&events)
        );
    }

    pub fn assert_logged_at_level(&self, level: Level, needle: &str) {
        let events = self.events();
        assert!(
            events
                .iter()
                .any(|e| e.level == level && e.message.contains(needle)),
            "no {level} event mentions {needle:?}; messages: {:#?}",
            messages(&events)
        );
    }

    /// The field's recorded value must contain `value`.
    pub fn assert_field_logged(&self, name: &str, value: &str) {
        let events = self.events();
        assert!(
            events
                .iter()
                .any(|e| e.fields.get(name).is_some_and(|v| v.contains(value))),
            "no event has {name}={value:?}; fields: {:#?}",
            events.iter().map(|e| &e.fields).collect::<Vec<_>>()
        );
    }

    pub fn assert_no_errors(&self) {
        let errors = self.at_or_above(Level::ERROR);
        assert!(errors.is_empty(), "Unexpected errors: {errors:#?}");
    }

    pub fn assert_no_warnings(&self) {
        let warnings = self.at_or_above(Level::WARN);
        assert!(warnings.is_empty(), "Unexpected warnings: {warnings:#?}");
    }

    fn at_or_above(&self, level: Level) -> Vec<CapturedLog> {
        // tracing orders ERROR < WARN < INFO
        self.events()
            .iter()
            .filter(|e| e.level <= level)
            .cloned()
            .collect()
    }

    fn events(&self) -> MutexGuard<'_, Vec<CapturedLog>> {
        self.events.lock().unwrap()
    }
}

fn messages(events: &[CapturedLog]) -> Vec<&str> {
    events.iter().map(|e| e.message.as_str()).collect()
}

struct Recorder {
    events: Arc<Mutex<Vec<CapturedLog>>>,
}

impl<S: Subscriber> Layer<S> for Recorder {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = FieldMap::default();
        event.record(&mut fields);
        let message = fields.0.remove("message").unwrap_or_default();
        self.events.lock().unwrap().push(CapturedLog {
            level: *event.metadata().level(),
            message,
            fields: fields.0,
        });
    }
}

#[derive(Default)]
struct FieldMap(BTreeMap<String, String>);

impl Visit for FieldMap {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        self.0.insert(field.name().to_string(), format!("{value:?}"));
    }
}
