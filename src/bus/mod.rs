//! Generic publish/subscribe primitive.
//!
//! Every other component composes with this capability rather than
//! inheriting from it:
//! - `Emitter`: named-event registry with synchronous, in-order broadcast
//! - `Subscription`: RAII handle that removes its listener on drop

mod emitter;

pub use emitter::{Emitter, Subscription, DEFAULT_MAX_LISTENERS};
