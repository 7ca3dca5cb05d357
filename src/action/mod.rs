//! Action vocabularies: named events over a shared emitter.

mod action;

pub use action::Action;
