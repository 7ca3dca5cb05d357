//! Broadcast point that seeds and reseeds stores from page data.
//!
//! An `Inflator` is constructed by the application's composition root and
//! injected into every store; there is no hidden global instance.

mod inflator;

pub use inflator::{Inflator, PageSource, PAGE_DATA_ID};
