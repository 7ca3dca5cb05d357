//! Stores: units of application state hydrated from page data.
//!
//! A store keeps an immutable `seed` and a working `data` value, rebinds
//! `data` to a clone of the seed on every `reset` broadcast, and notifies
//! its own subscribers with an `update` event when told it is `done`.
//! Hydration logic lives in a [`Hydrate`] implementation per store kind.

mod store;

pub use store::{Hydrate, Store};
