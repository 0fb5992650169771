//! Render composition: cameras, the drawing-backend boundary and the per-frame
//! render pass over the aspect registry.
//!
//! # Invariants
//! - The render pass never mutates the registry.
//! - Camera begin/end is a strict, non-reentrant bracket per backend context.
//! - Missing cameras or transforms are skipped, never treated as errors.
//!
//! The rasterizer sits behind [`DrawBackend`]. [`RecordingBackend`] captures
//! the command stream for tests, tooling and headless runs.

mod backend;
mod camera;
mod error;
mod layers;
mod mesh;
mod pass;
mod residency;
mod tracker;

pub use backend::{Capability, DirectionalLight, DrawBackend, DrawCommand, Primitive, RecordingBackend};
pub use camera::{Camera, CameraSettings, Freelook, Projection};
pub use error::RenderError;
pub use layers::LayerMask;
pub use mesh::{Bounds, Mesh, MeshContext, MeshFilter, Quad, draw_axis_gizmo, draw_mesh};
pub use pass::{RenderContext, RenderPass, RenderStats, Renderer};
pub use residency::MeshResidency;
pub use tracker::CameraTracker;
