//! Binding between stores and a host UI component.
//!
//! The host framework is injected, not imported: implementing [`Component`]
//! is the only integration surface. [`bind`] wraps a component so that a
//! named set of stores is mirrored into its rendered props.

mod enhance;

pub use enhance::{bind, Component, Enhanced};
