//! Utility Functions
//!
//! Helpers shared across the crate.

pub mod suggest;

pub use suggest::{closest_match, edit_distance};
