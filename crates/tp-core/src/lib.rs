//! tp-core: shared types for track selection.
//!
//! This crate is the foundational dependency for the other tp-* crates,
//! providing the track model and registry, selection outcome types, the
//! engine settings, and a unified error type.

pub mod config;
pub mod error;
pub mod registry;
pub mod track;

// Re-export the most commonly used items at the crate root.
pub use config::Settings;
pub use error::{Error, Result};
pub use registry::TrackRegistry;
pub use track::*;
