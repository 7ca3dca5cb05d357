use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, Weak};
use tracing::warn;

type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Listener ceiling applied to a fresh emitter. Exceeding it is not an
/// error; it only produces a diagnostic warning.
pub const DEFAULT_MAX_LISTENERS: usize = 10;

struct EmitterInner {
    // Map from event name to listeners in registration order
    channels: RwLock<HashMap<String, Vec<(usize, Listener)>>>,
    next_token: AtomicUsize,
    max_listeners: AtomicUsize,
}

/// A named-event emitter with synchronous broadcast.
///
/// Listeners for an event are invoked eagerly, in registration order,
/// within the same call stack as `emit`. There is no batching and no
/// cancellation of an in-flight broadcast.
///
/// Cloning an emitter yields a handle to the same listener registry.
#[derive(Clone)]
pub struct Emitter {
    inner: Arc<EmitterInner>,
}

impl Emitter {
    /// Create a new emitter with the default listener ceiling.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(EmitterInner {
                channels: RwLock::new(HashMap::new()),
                next_token: AtomicUsize::new(0),
                max_listeners: AtomicUsize::new(DEFAULT_MAX_LISTENERS),
            }),
        }
    }

    /// Raise or lower the diagnostic listener ceiling.
    pub fn set_max_listeners(&self, max: usize) {
        self.inner.max_listeners.store(max, Ordering::SeqCst);
    }

    /// Register a listener for `event`.
    ///
    /// The returned `Subscription` removes the listener when dropped.
    /// Call [`Subscription::detach`] to keep the listener registered for
    /// the life of the emitter instead.
    pub fn on<F>(&self, event: &str, listener: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let token = self.inner.next_token.fetch_add(1, Ordering::SeqCst);
        let mut channels = self.inner.channels.write().unwrap();
        let listeners = channels.entry(event.to_string()).or_default();
        listeners.push((token, Arc::new(listener)));

        let max = self.inner.max_listeners.load(Ordering::SeqCst);
        if listeners.len() > max {
            warn!(
                event,
                listeners = listeners.len(),
                max,
                "listener ceiling exceeded; possible listener leak"
            );
        }

        Subscription {
            event: event.to_string(),
            token,
            emitter: Arc::downgrade(&self.inner),
            active: true,
        }
    }

    /// Broadcast `payload` to every listener registered for `event`.
    ///
    /// Listeners run outside the registry lock, so they may subscribe or
    /// unsubscribe during the broadcast; such changes take effect for the
    /// next emission, not the current one.
    pub fn emit(&self, event: &str, payload: &Value) {
        let snapshot: Vec<Listener> = {
            let channels = self.inner.channels.read().unwrap();
            match channels.get(event) {
                Some(listeners) => listeners.iter().map(|(_, l)| Arc::clone(l)).collect(),
                None => return,
            }
        };
        for listener in snapshot {
            listener(payload);
        }
    }

    /// Number of listeners currently registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        let channels = self.inner.channels.read().unwrap();
        channels.get(event).map_or(0, Vec::len)
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII handle for a registered listener.
///
/// Dropping the handle removes the listener from its emitter; if the
/// emitter is already gone, removal is a no-op.
pub struct Subscription {
    event: String,
    token: usize,
    emitter: Weak<EmitterInner>,
    active: bool,
}

impl Subscription {
    /// Remove the listener now.
    pub fn cancel(mut self) {
        self.remove();
    }

    /// Keep the listener registered for the life of the emitter.
    pub fn detach(mut self) {
        self.active = false;
    }

    fn remove(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(inner) = self.emitter.upgrade() {
            let mut channels = inner.channels.write().unwrap();
            if let Some(listeners) = channels.get_mut(&self.event) {
                listeners.retain(|(token, _)| *token != self.token);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove();
    }
}
