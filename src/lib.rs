//! # Hydrant
//!
//! Flux-style state management with page-data hydration for Rust.
//!
//! Hydrant provides four small pieces that compose over a synchronous
//! publish/subscribe primitive:
//!
//! ## Inflator (broadcast point)
//!
//! One `Inflator` per process relays server-rendered page data to every
//! store: each `inflate` broadcasts `reset` to all stores, then the
//! deep-cloned payload. Inflation never fails; bad payloads degrade to an
//! empty mapping and are logged.
//!
//! ## Store (units of state)
//!
//! A `Store` holds an immutable seed and a working `data` value, restores
//! the seed on `reset`, merges page data through a per-store [`Hydrate`]
//! implementation, and emits `update` to its subscribers on `done`.
//!
//! ## Action (event vocabulary)
//!
//! An `Action` declares an ordered set of recognized event names over an
//! emitter. It routes nothing; dispatch stays with the caller.
//!
//! ## Enhance (component binding)
//!
//! [`bind`] wraps a host-framework component so a named set of stores is
//! mirrored into its rendered props and any store update re-renders it.

pub mod action;
pub mod bus;
pub mod clone;
pub mod enhance;
pub mod inflator;
pub mod store;

// Re-export main types for convenience
pub use action::Action;
pub use bus::{Emitter, Subscription};
pub use clone::{deep_clone, CloneError};
pub use enhance::{bind, Component, Enhanced};
pub use inflator::{Inflator, PageSource, PAGE_DATA_ID};
pub use store::{Hydrate, Store};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn it_works() {
        // Basic smoke test
        let inflator = Inflator::new();
        let store = Store::new(&inflator, &json!({"ready": false})).unwrap();
        store.modify(|data| data["ready"] = json!(true));
        assert_eq!(store.data(), json!({"ready": true}));
        store.reset();
        assert_eq!(store.data(), json!({"ready": false}));
    }
}
