use crate::bus::{Emitter, Subscription};
use crate::clone::{deep_clone, CloneError};
use crate::inflator::Inflator;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, warn};

const UPDATE: &str = "update";

/// Hydration contract implemented per store kind.
///
/// Both hooks default to diagnostic no-ops: a store whose hydrator never
/// merges page data logs a warning instead of crashing. `()` implements
/// the defaults for plain stores with no hydration logic.
pub trait Hydrate: Send + Sync + 'static {
    /// Merge an inflate payload into the store's working data, then call
    /// [`Store::done`] to notify subscribers.
    fn inflate(&self, _store: &Store, _payload: &Value) {
        warn!(
            hydrator = std::any::type_name::<Self>(),
            "store does not define an inflate hook; page data dropped"
        );
    }

    /// Register any extra listeners at construction time. Park their
    /// guards with [`Store::retain`] to keep them for the store's life.
    fn init(&self, _store: &Store) {
        debug!(
            hydrator = std::any::type_name::<Self>(),
            "store does not define an init hook"
        );
    }
}

impl Hydrate for () {}

struct StoreInner {
    seed: Value,
    data: RwLock<Value>,
    update: Emitter,
    hydrator: Box<dyn Hydrate>,
    retained: Mutex<Vec<Subscription>>,
}

/// A unit of application state bound to an [`Inflator`].
///
/// At construction the store clones its seed into the working data,
/// subscribes to the inflator's `reset` and `inflate` broadcasts (in that
/// order), and finally runs the hydrator's `init` hook. Construction is
/// synchronous, so no broadcast can be observed before `init` returns.
///
/// Cloning a `Store` yields a handle to the same shared state and
/// subscriptions.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Create a plain store with no hydration logic.
    ///
    /// Fails if `seed` is not JSON-serializable; after construction the
    /// seed is a typed value and `reset` can no longer fail.
    pub fn new<T: Serialize + ?Sized>(inflator: &Inflator, seed: &T) -> Result<Self, CloneError> {
        Self::with_hydrator(inflator, seed, ())
    }

    /// Create a store whose inflate/init behavior is given by `hydrator`.
    pub fn with_hydrator<T, H>(
        inflator: &Inflator,
        seed: &T,
        hydrator: H,
    ) -> Result<Self, CloneError>
    where
        T: Serialize + ?Sized,
        H: Hydrate,
    {
        let seed = deep_clone(seed)?;
        let update = Emitter::new();
        update.set_max_listeners(100);

        let store = Store {
            inner: Arc::new(StoreInner {
                data: RwLock::new(seed.clone()),
                seed,
                update,
                hydrator: Box::new(hydrator),
                retained: Mutex::new(Vec::new()),
            }),
        };

        // reset must be bound before inflate: the cross-store ordering
        // guarantee (all resets, then all inflates) relies on it
        let reset_store = store.clone();
        store.retain(inflator.on_reset(move || reset_store.reset()));

        let inflate_store = store.clone();
        store.retain(inflator.on_inflate(move |payload| {
            inflate_store
                .inner
                .hydrator
                .inflate(&inflate_store, payload);
        }));

        store.inner.hydrator.init(&store);
        Ok(store)
    }

    /// The original seed data, immutable after construction.
    pub fn seed(&self) -> &Value {
        &self.inner.seed
    }

    /// A snapshot of the current working data.
    ///
    /// The snapshot is a clone; no external reference ever aliases the
    /// store's internal value.
    pub fn data(&self) -> Value {
        self.inner.data.read().unwrap().clone()
    }

    /// Read the working data without cloning.
    pub fn with_data<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        let data = self.inner.data.read().unwrap();
        f(&data)
    }

    /// Mutate the working data without notifying subscribers.
    pub fn modify(&self, f: impl FnOnce(&mut Value)) {
        let mut data = self.inner.data.write().unwrap();
        f(&mut data);
    }

    /// Restore the working data to a clone of the seed.
    pub fn reset(&self) {
        *self.inner.data.write().unwrap() = self.inner.seed.clone();
    }

    /// Emit `update` with a snapshot of the current data.
    ///
    /// Legal without a prior mutation; subscribers fire either way.
    pub fn done(&self) {
        let snapshot = self.data();
        self.inner.update.emit(UPDATE, &snapshot);
    }

    /// Subscribe to the `update` event. Dropping the returned handle
    /// unsubscribes; a `done` after that does not invoke the callback.
    pub fn on_update<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.inner.update.on(UPDATE, callback)
    }

    /// Park a subscription guard for the store's lifetime.
    pub fn retain(&self, subscription: Subscription) {
        self.inner.retained.lock().unwrap().push(subscription);
    }

    /// Number of `update` listeners currently registered.
    pub fn update_listener_count(&self) -> usize {
        self.inner.update.listener_count(UPDATE)
    }
}
