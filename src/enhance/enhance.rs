use crate::bus::Subscription;
use crate::store::Store;
use serde_json::{Map, Value};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// The host framework's render capability.
///
/// A component receives the merged store-state and explicit props as one
/// mapping and produces whatever the host framework renders with.
pub trait Component: Send + Sync + 'static {
    type Output;

    fn render(&self, props: &Map<String, Value>) -> Self::Output;
}

struct EnhancedInner<C> {
    child: C,
    stores: Vec<(String, Store)>,
    props: RwLock<Map<String, Value>>,
    state: RwLock<Map<String, Value>>,
}

impl<C: Component> EnhancedInner<C> {
    fn snapshot(&self) -> Map<String, Value> {
        self.stores
            .iter()
            .map(|(name, store)| (name.clone(), store.data()))
            .collect()
    }

    fn render(&self) -> C::Output {
        let mut merged = self.state.read().unwrap().clone();
        // explicit props win over store state on key collision
        for (key, value) in self.props.read().unwrap().iter() {
            merged.insert(key.clone(), value.clone());
        }
        self.child.render(&merged)
    }
}

/// A component wrapper that mirrors store data into rendered props.
///
/// State is the full name→data snapshot of every bound store. On any
/// store's `update` event the whole snapshot is recomputed, not just the
/// changed store's entry. Dropping the wrapper unmounts it.
pub struct Enhanced<C: Component> {
    inner: Arc<EnhancedInner<C>>,
    subs: Vec<Subscription>,
}

/// Wrap `child` so the named stores' data is mirrored into its props.
///
/// The initial state snapshot is computed here, before any mounting.
pub fn bind<C, N, I>(child: C, stores: I) -> Enhanced<C>
where
    C: Component,
    N: Into<String>,
    I: IntoIterator<Item = (N, Store)>,
{
    let stores: Vec<(String, Store)> = stores
        .into_iter()
        .map(|(name, store)| (name.into(), store))
        .collect();
    let state = stores
        .iter()
        .map(|(name, store)| (name.clone(), store.data()))
        .collect();

    Enhanced {
        inner: Arc::new(EnhancedInner {
            child,
            stores,
            props: RwLock::new(Map::new()),
            state: RwLock::new(state),
        }),
        subs: Vec::new(),
    }
}

impl<C: Component> Enhanced<C> {
    /// Set explicit props merged into every render.
    ///
    /// On a key collision these take precedence over store-derived state.
    pub fn with_props(self, props: Map<String, Value>) -> Self {
        *self.inner.props.write().unwrap() = props;
        self
    }

    /// Subscribe to every bound store's `update` event.
    ///
    /// On any update the full state snapshot is recomputed and `on_render`
    /// is invoked with the freshly rendered output. Mounting again first
    /// drops the previous subscriptions.
    pub fn mount<F>(&mut self, on_render: F)
    where
        F: Fn(C::Output) + Send + Sync + 'static,
    {
        self.subs.clear();
        let on_render = Arc::new(on_render);

        for (name, store) in &self.inner.stores {
            debug!(store = name.as_str(), "mounting store binding");
            let inner = Arc::clone(&self.inner);
            let on_render = Arc::clone(&on_render);
            let sub = store.on_update(move |_| {
                *inner.state.write().unwrap() = inner.snapshot();
                on_render(inner.render());
            });
            self.subs.push(sub);
        }
    }

    /// Unsubscribe from every bound store.
    pub fn unmount(&mut self) {
        self.subs.clear();
    }

    /// The current state snapshot (name → store data).
    pub fn state(&self) -> Map<String, Value> {
        self.inner.state.read().unwrap().clone()
    }

    /// Render on demand with the merged state and props.
    pub fn render(&self) -> C::Output {
        self.inner.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inflator::Inflator;
    use serde_json::json;
    use std::sync::Mutex;

    /// Renders its props back out so tests can inspect the merge.
    struct Echo;

    impl Component for Echo {
        type Output = Map<String, Value>;

        fn render(&self, props: &Map<String, Value>) -> Self::Output {
            props.clone()
        }
    }

    fn props(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn initial_state_mirrors_every_store() {
        let inflator = Inflator::new();
        let a = Store::new(&inflator, &json!({"x": 1})).unwrap();
        let b = Store::new(&inflator, &json!({"y": 2})).unwrap();

        let wrapper = bind(Echo, [("A", a), ("B", b)]);
        assert_eq!(
            Value::Object(wrapper.state()),
            json!({"A": {"x": 1}, "B": {"y": 2}})
        );
    }

    #[test]
    fn update_recomputes_the_full_snapshot() {
        let inflator = Inflator::new();
        let a = Store::new(&inflator, &json!({"x": 1})).unwrap();
        let b = Store::new(&inflator, &json!({"y": 2})).unwrap();

        let mut wrapper = bind(Echo, [("A", a.clone()), ("B", b.clone())]);
        let rendered = Arc::new(Mutex::new(Vec::new()));
        let rendered_clone = rendered.clone();
        wrapper.mount(move |output| rendered_clone.lock().unwrap().push(output));

        a.modify(|data| data["x"] = json!(10));
        b.modify(|data| data["y"] = json!(20));
        a.done();

        let rendered = rendered.lock().unwrap();
        assert_eq!(rendered.len(), 1);
        // both keys recomputed, not just the store that fired
        assert_eq!(
            Value::Object(rendered[0].clone()),
            json!({"A": {"x": 10}, "B": {"y": 20}})
        );
    }

    #[test]
    fn unmount_stops_renders() {
        let inflator = Inflator::new();
        let a = Store::new(&inflator, &json!({})).unwrap();

        let mut wrapper = bind(Echo, [("A", a.clone())]);
        let renders = Arc::new(Mutex::new(0));
        let renders_clone = renders.clone();
        wrapper.mount(move |_| *renders_clone.lock().unwrap() += 1);

        a.done();
        wrapper.unmount();
        a.done();

        assert_eq!(*renders.lock().unwrap(), 1);
        assert_eq!(a.update_listener_count(), 0);
    }

    #[test]
    fn dropping_the_wrapper_unmounts() {
        let inflator = Inflator::new();
        let a = Store::new(&inflator, &json!({})).unwrap();

        let mut wrapper = bind(Echo, [("A", a.clone())]);
        wrapper.mount(|_| {});
        assert_eq!(a.update_listener_count(), 1);

        drop(wrapper);
        assert_eq!(a.update_listener_count(), 0);
    }

    #[test]
    fn explicit_props_win_on_key_collision() {
        let inflator = Inflator::new();
        let a = Store::new(&inflator, &json!({"x": 1})).unwrap();

        let wrapper =
            bind(Echo, [("A", a)]).with_props(props(json!({"A": "mine", "extra": true})));

        let output = wrapper.render();
        assert_eq!(output["A"], json!("mine"));
        assert_eq!(output["extra"], json!(true));
    }

    #[test]
    fn mounting_twice_does_not_double_subscribe() {
        let inflator = Inflator::new();
        let a = Store::new(&inflator, &json!({})).unwrap();

        let mut wrapper = bind(Echo, [("A", a.clone())]);
        wrapper.mount(|_| {});
        wrapper.mount(|_| {});

        assert_eq!(a.update_listener_count(), 1);
    }
}
