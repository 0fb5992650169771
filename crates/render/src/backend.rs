use glam::{Mat4, Vec3, Vec4};
use std::collections::HashSet;
use std::fmt::Write as _;

/// Primitive kinds accepted between [`DrawBackend::begin`] and
/// [`DrawBackend::end`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Points,
    Lines,
    Triangles,
    Quads,
    Polygon,
}

/// Toggleable pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Source-alpha / one-minus-source-alpha blending.
    Blend,
    CullFace,
    Lighting,
    /// Vertex colors feed the diffuse material term.
    ColorMaterial,
}

/// The single directional light a lit camera installs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Direction the light travels from, in world space.
    pub direction: Vec3,
    pub diffuse: Vec4,
    pub ambient: Vec4,
}

/// Immediate-mode drawing backend.
///
/// The render pass drives this interface and never assumes anything about
/// how it rasterizes. Matrix calls act on the modelview stack; the projection
/// is loaded separately.
pub trait DrawBackend {
    fn load_projection(&mut self, projection: Mat4);
    fn push_matrix(&mut self);
    fn pop_matrix(&mut self);
    fn load_matrix(&mut self, matrix: Mat4);
    fn mult_matrix(&mut self, matrix: Mat4);
    fn begin(&mut self, primitive: Primitive);
    fn end(&mut self);
    fn color(&mut self, color: Vec4);
    fn normal(&mut self, normal: Vec3);
    fn vertex(&mut self, position: Vec3);
    fn enable(&mut self, capability: Capability);
    fn disable(&mut self, capability: Capability);
    fn set_light(&mut self, light: DirectionalLight);
}

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    LoadProjection(Mat4),
    PushMatrix,
    PopMatrix,
    LoadMatrix(Mat4),
    MultMatrix(Mat4),
    Begin(Primitive),
    End,
    Color(Vec4),
    Normal(Vec3),
    Vertex(Vec3),
    Enable(Capability),
    Disable(Capability),
    SetLight(DirectionalLight),
}

/// Backend that records every call instead of rasterizing.
///
/// Tracks matrix stack depth, stack underflows and primitive brackets so
/// tests can assert that a frame leaves the backend balanced.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    commands: Vec<DrawCommand>,
    depth: usize,
    max_depth: usize,
    underflows: usize,
    open: Option<Primitive>,
    enabled: HashSet<Capability>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Take the recorded commands, keeping stack and capability state.
    pub fn drain(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Current modelview stack depth above the base matrix.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Pops issued against an empty stack.
    pub fn underflows(&self) -> usize {
        self.underflows
    }

    pub fn open_primitive(&self) -> Option<Primitive> {
        self.open
    }

    pub fn is_enabled(&self, capability: Capability) -> bool {
        self.enabled.contains(&capability)
    }

    pub fn count(&self, predicate: impl Fn(&DrawCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| predicate(c)).count()
    }

    pub fn vertex_count(&self) -> usize {
        self.count(|c| matches!(c, DrawCommand::Vertex(_)))
    }

    /// Whether every push was popped and every primitive closed.
    pub fn is_balanced(&self) -> bool {
        self.depth == 0 && self.underflows == 0 && self.open.is_none()
    }

    /// Human-readable dump, one command per line, nested by stack depth.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let mut indent = 0usize;
        for command in &self.commands {
            if matches!(command, DrawCommand::PopMatrix | DrawCommand::End) {
                indent = indent.saturating_sub(1);
            }
            let pad = "  ".repeat(indent);
            let _ = match command {
                DrawCommand::Vertex(v) => {
                    writeln!(out, "{pad}vertex ({:.2}, {:.2}, {:.2})", v.x, v.y, v.z)
                }
                DrawCommand::Color(c) => writeln!(
                    out,
                    "{pad}color ({:.2}, {:.2}, {:.2}, {:.2})",
                    c.x, c.y, c.z, c.w
                ),
                DrawCommand::Normal(n) => {
                    writeln!(out, "{pad}normal ({:.2}, {:.2}, {:.2})", n.x, n.y, n.z)
                }
                DrawCommand::LoadProjection(_) => writeln!(out, "{pad}load_projection"),
                DrawCommand::LoadMatrix(_) => writeln!(out, "{pad}load_matrix"),
                DrawCommand::MultMatrix(_) => writeln!(out, "{pad}mult_matrix"),
                other => writeln!(out, "{pad}{other:?}"),
            };
            if matches!(command, DrawCommand::PushMatrix | DrawCommand::Begin(_)) {
                indent += 1;
            }
        }
        out
    }
}

impl DrawBackend for RecordingBackend {
    fn load_projection(&mut self, projection: Mat4) {
        self.commands.push(DrawCommand::LoadProjection(projection));
    }

    fn push_matrix(&mut self) {
        self.depth += 1;
        self.max_depth = self.max_depth.max(self.depth);
        self.commands.push(DrawCommand::PushMatrix);
    }

    fn pop_matrix(&mut self) {
        if self.depth == 0 {
            self.underflows += 1;
            tracing::warn!("matrix stack underflow");
        } else {
            self.depth -= 1;
        }
        self.commands.push(DrawCommand::PopMatrix);
    }

    fn load_matrix(&mut self, matrix: Mat4) {
        self.commands.push(DrawCommand::LoadMatrix(matrix));
    }

    fn mult_matrix(&mut self, matrix: Mat4) {
        self.commands.push(DrawCommand::MultMatrix(matrix));
    }

    fn begin(&mut self, primitive: Primitive) {
        if let Some(open) = self.open {
            tracing::warn!(?open, ?primitive, "primitive begun inside another");
        }
        self.open = Some(primitive);
        self.commands.push(DrawCommand::Begin(primitive));
    }

    fn end(&mut self) {
        if self.open.take().is_none() {
            tracing::warn!("primitive end without begin");
        }
        self.commands.push(DrawCommand::End);
    }

    fn color(&mut self, color: Vec4) {
        self.commands.push(DrawCommand::Color(color));
    }

    fn normal(&mut self, normal: Vec3) {
        self.commands.push(DrawCommand::Normal(normal));
    }

    fn vertex(&mut self, position: Vec3) {
        self.commands.push(DrawCommand::Vertex(position));
    }

    fn enable(&mut self, capability: Capability) {
        self.enabled.insert(capability);
        self.commands.push(DrawCommand::Enable(capability));
    }

    fn disable(&mut self, capability: Capability) {
        self.enabled.remove(&capability);
        self.commands.push(DrawCommand::Disable(capability));
    }

    fn set_light(&mut self, light: DirectionalLight) {
        self.commands.push(DrawCommand::SetLight(light));
    }
}
