//! Engine kernel: the single owner of registry, render state and configuration.
//!
//! # Invariants
//! - There is no process-wide state; every engine is an independent value.
//! - Camera lookups (main, current) are weak and re-validated against the
//!   registry on every call.
//! - Freelook camera poses are written back to their `Transform` each update,
//!   so the render pass only ever reads transforms.

pub mod config;
pub mod engine;

pub use config::{ConfigError, EngineConfig, SceneObject, Viewport};
pub use engine::Engine;
