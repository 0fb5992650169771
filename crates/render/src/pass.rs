use glam::Vec4;
use vesper_common::{EntityId, Transform};
use vesper_ecs::{Aspect, Registry};

use crate::backend::DrawBackend;
use crate::camera::Camera;
use crate::error::RenderError;
use crate::layers::LayerMask;
use crate::mesh::{MeshFilter, draw_axis_gizmo, draw_mesh};

/// Marks an entity as drawable on the given layers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Renderer {
    pub layers: LayerMask,
    /// Base color for mesh vertices.
    pub color: Vec4,
}

impl Aspect for Renderer {}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            layers: LayerMask::default(),
            color: Vec4::ONE,
        }
    }
}

impl Renderer {
    pub fn new(layers: LayerMask) -> Self {
        Self {
            layers,
            ..Self::default()
        }
    }

    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }
}

/// Frame-scoped render state: the open camera bracket, the most recently
/// begun camera and the elapsed clock that drives the light.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    current: Option<EntityId>,
    open: Option<EntityId>,
    elapsed: f32,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The camera most recently begun. Stays set after its bracket closes.
    pub fn current(&self) -> Option<EntityId> {
        self.current
    }

    /// The camera whose bracket is open right now.
    pub fn active(&self) -> Option<EntityId> {
        self.open
    }

    /// The current camera, if it is still attached.
    pub fn current_camera<'r>(&self, registry: &'r Registry) -> Option<(EntityId, &'r Camera)> {
        let id = self.current?;
        registry.get::<Camera>(id).map(|camera| (id, camera))
    }

    /// Seconds since the context was created.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt;
    }

    pub(crate) fn open_bracket(&mut self, id: EntityId) -> Result<(), RenderError> {
        if let Some(open) = self.open {
            return Err(RenderError::NestedBegin {
                open,
                requested: id,
            });
        }
        self.open = Some(id);
        self.current = Some(id);
        Ok(())
    }

    pub(crate) fn close_bracket(&mut self) -> Result<EntityId, RenderError> {
        self.open.take().ok_or(RenderError::UnmatchedEnd)
    }
}

/// What one frame drew. Renderer counts accumulate across cameras.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub cameras: usize,
    /// Cameras without a transform.
    pub cameras_skipped: usize,
    /// Renderer draws, meshes and gizmos together.
    pub drawn: usize,
    pub gizmos: usize,
    /// Renderers rejected by layer mask.
    pub culled: usize,
    /// Renderers without a transform.
    pub unplaced: usize,
}

/// Draws every camera's view of the registry.
///
/// Cameras run in attach order; within each camera, renderers run in attach
/// order. The registry is only read.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderPass;

impl RenderPass {
    pub fn new() -> Self {
        Self
    }

    pub fn render(
        &self,
        registry: &Registry,
        ctx: &mut RenderContext,
        backend: &mut dyn DrawBackend,
    ) -> Result<RenderStats, RenderError> {
        let _span = tracing::info_span!("render_pass").entered();
        let mut stats = RenderStats::default();

        for (camera_id, camera) in registry.iter::<Camera>() {
            let Some(pose) = registry.get::<Transform>(camera_id) else {
                tracing::trace!(camera = %camera_id, "camera has no transform; skipped");
                stats.cameras_skipped += 1;
                continue;
            };

            camera.begin(camera_id, ctx, backend, pose.model_matrix())?;
            stats.cameras += 1;

            for (id, renderer) in registry.iter::<Renderer>() {
                let Some(transform) = registry.get::<Transform>(id) else {
                    tracing::trace!(entity = %id, "renderer has no transform; skipped");
                    stats.unplaced += 1;
                    continue;
                };
                if !renderer.layers.intersects(camera.layers()) {
                    stats.culled += 1;
                    continue;
                }

                match registry.get::<MeshFilter>(id) {
                    Some(filter) => draw_mesh(
                        filter.mesh(),
                        backend,
                        transform,
                        renderer.color,
                        camera.uses_lighting(),
                    ),
                    None => {
                        draw_axis_gizmo(backend, transform.model_matrix());
                        stats.gizmos += 1;
                    }
                }
                stats.drawn += 1;
            }

            camera.end(ctx, backend)?;
        }

        tracing::trace!(?stats, "frame rendered");
        Ok(stats)
    }
}
