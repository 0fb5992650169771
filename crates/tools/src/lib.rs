//! Developer tooling: read-only inspection of a running engine.
//!
//! # Invariants
//! - Tools never mutate the registry they inspect.

mod inspector;

pub use inspector::{CameraInfo, EntityInfo, RegistryInspector, RegistrySummary};
