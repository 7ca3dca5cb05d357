use crate::bus::{Emitter, Subscription};
use serde_json::Value;

/// A fixed vocabulary of event names over an emitter.
///
/// An action declares the events it recognizes as an ordered name→value
/// mapping and otherwise exposes the plain emit/subscribe capability; it
/// routes nothing. Dispatch is left to the caller.
///
/// The listener ceiling is raised so many stores can subscribe to one
/// action without diagnostic warnings.
#[derive(Clone)]
pub struct Action {
    events: Vec<(String, String)>,
    bus: Emitter,
}

impl Action {
    /// Create an action from an ordered name→value mapping.
    ///
    /// Insertion order of the mapping is preserved by
    /// [`event_names`](Self::event_names).
    pub fn new<K, V, I>(events: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let events = events
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();
        let bus = Emitter::new();
        bus.set_max_listeners(100);
        Self { events, bus }
    }

    /// The declared mapping, in insertion order.
    pub fn events(&self) -> &[(String, String)] {
        &self.events
    }

    /// The ordered sequence of declared names.
    pub fn event_names(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(|(name, _)| name.as_str())
    }

    /// The event identifier declared under `name`, if any.
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.events
            .iter()
            .find(|(declared, _)| declared == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn emit(&self, event: &str, payload: &Value) {
        self.bus.emit(event, payload);
    }

    pub fn on<F>(&self, event: &str, listener: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.bus.on(event, listener)
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.bus.listener_count(event)
    }
}

impl Default for Action {
    fn default() -> Self {
        Self::new(std::iter::empty::<(String, String)>())
    }
}
