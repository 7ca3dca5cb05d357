use crate::bus::{Emitter, Subscription};
use crate::clone::deep_clone;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::RwLock;
use tracing::{debug, error};

/// Reserved identifier of the host-page element carrying embedded data.
pub const PAGE_DATA_ID: &str = "page-data";

const RESET: &str = "reset";
const INFLATE: &str = "inflate";

/// Host-page data access, injected rather than imported.
///
/// `read` returns the raw text content of the element with the given
/// reserved id, or `None` when no such element exists. Any closure
/// `Fn(&str) -> Option<String>` works as a source.
pub trait PageSource: Send + Sync + 'static {
    fn read(&self, id: &str) -> Option<String>;
}

impl<F> PageSource for F
where
    F: Fn(&str) -> Option<String> + Send + Sync + 'static,
{
    fn read(&self, id: &str) -> Option<String> {
        self(id)
    }
}

/// Relay that broadcasts `reset` then `inflate` to every subscribed store.
///
/// The inflator holds no data between calls. Broadcast is eager and
/// synchronous: for a single `inflate`, every subscriber receives `reset`
/// (in subscription order) before any subscriber receives `inflate`.
///
/// Inflation never fails. Payloads that cannot be serialized degrade to an
/// empty mapping and the failure is logged.
pub struct Inflator {
    bus: Emitter,
    source: RwLock<Option<Box<dyn PageSource>>>,
}

impl Inflator {
    pub fn new() -> Self {
        Self {
            bus: Emitter::new(),
            source: RwLock::new(None),
        }
    }

    /// Create an inflator that reads page data from `source` when
    /// [`inflate_from_page`](Self::inflate_from_page) is called.
    pub fn with_page_source(source: impl PageSource) -> Self {
        let inflator = Self::new();
        inflator.set_page_source(source);
        inflator
    }

    pub fn set_page_source(&self, source: impl PageSource) {
        *self.source.write().unwrap() = Some(Box::new(source));
    }

    /// Deep-clone `payload` and broadcast it to all subscribed stores.
    pub fn inflate<T: Serialize + ?Sized>(&self, payload: &T) {
        let cloned = match deep_clone(payload) {
            Ok(value) => value,
            Err(err) => {
                error!(%err, "inflate payload failed to serialize; broadcasting empty data");
                Value::Object(Map::new())
            }
        };
        self.broadcast(cloned);
    }

    /// Read, parse and broadcast the data embedded in the host page.
    ///
    /// A missing source inflates with an empty mapping; a missing element
    /// or unparseable content inflates with `{"error": <details>}`. Both
    /// failures are logged, neither is propagated.
    pub fn inflate_from_page(&self) {
        let payload = self.load_page_data();
        self.broadcast(payload);
    }

    fn load_page_data(&self) -> Value {
        let source = self.source.read().unwrap();
        let Some(source) = source.as_deref() else {
            debug!("no page source configured; inflating with empty data");
            return Value::Object(Map::new());
        };
        let Some(text) = source.read(PAGE_DATA_ID) else {
            error!(id = PAGE_DATA_ID, "page data element not found");
            return json!({ "error": format!("page data element `{PAGE_DATA_ID}` not found") });
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(value) if value.is_null() => Value::Object(Map::new()),
            Ok(value) => value,
            Err(err) => {
                error!(%err, id = PAGE_DATA_ID, "page data is not valid JSON");
                json!({ "error": err.to_string() })
            }
        }
    }

    fn broadcast(&self, payload: Value) {
        self.bus.emit(RESET, &Value::Null);
        self.bus.emit(INFLATE, &payload);
    }

    /// Subscribe to the `reset` broadcast. Stores call this once, at
    /// construction; repeated `inflate` calls never add listeners.
    pub fn on_reset<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.bus.on(RESET, move |_| listener())
    }

    /// Subscribe to the `inflate` broadcast with its cloned payload.
    pub fn on_inflate<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.bus.on(INFLATE, listener)
    }

    pub fn reset_listener_count(&self) -> usize {
        self.bus.listener_count(RESET)
    }

    pub fn inflate_listener_count(&self) -> usize {
        self.bus.listener_count(INFLATE)
    }
}

impl Default for Inflator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::sync::{Arc, Mutex};

    fn capture(inflator: &Inflator) -> (Arc<Mutex<Vec<Value>>>, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let sub = inflator.on_inflate(move |payload| {
            seen_clone.lock().unwrap().push(payload.clone());
        });
        (seen, sub)
    }

    #[test]
    fn inflate_broadcasts_a_clone_of_the_payload() {
        let inflator = Inflator::new();
        let (seen, _sub) = capture(&inflator);

        inflator.inflate(&json!({"count": 5}));
        assert_eq!(*seen.lock().unwrap(), vec![json!({"count": 5})]);
    }

    #[test]
    fn reset_precedes_inflate() {
        let inflator = Inflator::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let log_reset = log.clone();
        let _r = inflator.on_reset(move || log_reset.lock().unwrap().push("reset"));
        let log_inflate = log.clone();
        let _i = inflator.on_inflate(move |_| log_inflate.lock().unwrap().push("inflate"));

        inflator.inflate(&json!({}));
        assert_eq!(*log.lock().unwrap(), vec!["reset", "inflate"]);
    }

    #[test]
    fn unserializable_payload_degrades_to_empty_mapping() {
        struct NotJson;

        impl Serialize for NotJson {
            fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("cyclic"))
            }
        }

        let inflator = Inflator::new();
        let (seen, _sub) = capture(&inflator);

        inflator.inflate(&NotJson);
        assert_eq!(*seen.lock().unwrap(), vec![json!({})]);
    }

    #[test]
    fn page_inflate_without_source_is_empty() {
        let inflator = Inflator::new();
        let (seen, _sub) = capture(&inflator);

        inflator.inflate_from_page();
        assert_eq!(*seen.lock().unwrap(), vec![json!({})]);
    }

    #[test]
    fn page_inflate_reads_the_reserved_element() {
        let inflator = Inflator::with_page_source(|id: &str| {
            assert_eq!(id, PAGE_DATA_ID);
            Some(r#"{"user": "ada"}"#.to_string())
        });
        let (seen, _sub) = capture(&inflator);

        inflator.inflate_from_page();
        assert_eq!(*seen.lock().unwrap(), vec![json!({"user": "ada"})]);
    }

    #[test]
    fn missing_element_inflates_with_error_payload() {
        let inflator = Inflator::with_page_source(|_: &str| None);
        let (seen, _sub) = capture(&inflator);

        inflator.inflate_from_page();
        let seen = seen.lock().unwrap();
        assert!(seen[0]["error"].is_string());
    }

    #[test]
    fn invalid_json_inflates_with_error_payload() {
        let inflator = Inflator::with_page_source(|_: &str| Some("not json".to_string()));
        let (seen, _sub) = capture(&inflator);

        inflator.inflate_from_page();
        let seen = seen.lock().unwrap();
        assert!(seen[0]["error"].is_string());
    }

    #[test]
    fn repeated_inflate_does_not_grow_listener_count() {
        let inflator = Inflator::new();
        let (_seen, _sub) = capture(&inflator);
        assert_eq!(inflator.inflate_listener_count(), 1);

        inflator.inflate(&json!({}));
        inflator.inflate(&json!({}));
        assert_eq!(inflator.inflate_listener_count(), 1);
    }
}
