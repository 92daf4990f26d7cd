//! In-memory event capture for tests
//!
//! Installs a global subscriber whose only layer records every event with its
//! fields as strings. Tests filter by store id, since every test binary shares
//! the one subscriber.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use minidb_core_types::schema::{
    EVENT_STATEMENT, FIELD_ERR_CODE, FIELD_EVENT, FIELD_OP, FIELD_PARAMS, FIELD_ROW_ID, FIELD_SQL,
    FIELD_STORE_ID, FIELD_TABLE, OP_SQL,
};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// One recorded event; field values are kept in their display form
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    pub fields: HashMap<String, String>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn op(&self) -> Option<&str> {
        self.field(FIELD_OP)
    }

    pub fn event(&self) -> Option<&str> {
        self.field(FIELD_EVENT)
    }

    /// Whether this is the `event` boundary of `op`
    pub fn is(&self, op: &str, event: &str) -> bool {
        self.op() == Some(op) && self.event() == Some(event)
    }

    pub fn store_id(&self) -> Option<&str> {
        self.field(FIELD_STORE_ID)
    }

    pub fn table(&self) -> Option<&str> {
        self.field(FIELD_TABLE)
    }

    pub fn row_id(&self) -> Option<&str> {
        self.field(FIELD_ROW_ID)
    }

    pub fn err_code(&self) -> Option<&str> {
        self.field(FIELD_ERR_CODE)
    }

    /// Echoed SQL text, for statement events
    pub fn sql(&self) -> Option<&str> {
        self.field(FIELD_SQL)
    }

    /// Echoed parameter list, for statement events
    pub fn params(&self) -> Option<&str> {
        self.field(FIELD_PARAMS)
    }

    pub fn is_statement(&self) -> bool {
        self.is(OP_SQL, EVENT_STATEMENT)
    }
}

/// Strings are kept bare; everything else goes through `Debug`
struct FieldRecorder<'a>(&'a mut HashMap<String, String>);

impl Visit for FieldRecorder<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{:?}", value));
    }
}

struct CaptureLayer {
    sink: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = HashMap::new();
        event.record(&mut FieldRecorder(&mut fields));
        self.sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(CapturedEvent {
                level: *event.metadata().level(),
                fields,
            });
    }
}

/// Handle onto the captured events
#[derive(Clone)]
pub struct TestCapture {
    sink: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl TestCapture {
    /// Snapshot of everything captured so far
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Events logged by the store with `store_id`
    pub fn for_store(&self, store_id: &str) -> Vec<CapturedEvent> {
        self.filtered(|e| e.store_id() == Some(store_id))
    }

    /// Statement echoes of one store, in execution order
    pub fn statements(&self, store_id: &str) -> Vec<CapturedEvent> {
        self.filtered(|e| e.is_statement() && e.store_id() == Some(store_id))
    }

    /// First `event` boundary of `op`
    pub fn find(&self, op: &str, event: &str) -> Option<CapturedEvent> {
        self.filtered(|e| e.is(op, event)).into_iter().next()
    }

    pub fn count(&self, op: &str, event: &str) -> usize {
        self.filtered(|e| e.is(op, event)).len()
    }

    /// # Panics
    ///
    /// When no `event` boundary of `op` was captured
    pub fn assert_event_exists(&self, op: &str, event: &str) {
        let total = self.sink.lock().unwrap_or_else(PoisonError::into_inner).len();
        assert!(
            self.find(op, event).is_some(),
            "Expected event op={} event={} not found in {} captured events",
            op,
            event,
            total
        );
    }

    pub fn clear(&self) {
        self.sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn filtered(&self, keep: impl Fn(&CapturedEvent) -> bool) -> Vec<CapturedEvent> {
        self.sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| keep(e))
            .cloned()
            .collect()
    }
}

static CAPTURE: OnceLock<TestCapture> = OnceLock::new();

/// Install the capturing subscriber on first call; later calls share it
///
/// ```
/// use minidb_core::logging_facility::test_capture::init_test_capture;
/// use minidb_core::log_op_start;
///
/// let capture = init_test_capture();
/// log_op_start!("register");
/// capture.assert_event_exists("register", "start");
/// ```
pub fn init_test_capture() -> TestCapture {
    CAPTURE
        .get_or_init(|| {
            let sink = Arc::new(Mutex::new(Vec::new()));
            tracing_subscriber::registry()
                .with(CaptureLayer { sink: sink.clone() })
                .init();
            TestCapture { sink }
        })
        .clone()
}
