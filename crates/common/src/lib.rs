//! Shared value types for the vesper engine.
//!
//! # Invariants
//! - Entity ids carry identity only; all data lives in aspects.
//! - Transform matrices are pure functions of position, rotation and scale.

mod types;

pub use types::{EntityId, Transform};
