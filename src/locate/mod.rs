//! Field queries: structured `SEG-F.C.S` addresses and free-text description search

mod location;
mod locator;
mod search;

pub use location::{FieldLocation, FieldPath};
pub use locator::{locate, FieldMatch};
pub use search::{FindStep, SearchState};
