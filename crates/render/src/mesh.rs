use glam::{Mat4, Vec3, Vec4};
use std::fmt;
use std::rc::Rc;
use vesper_common::Transform;
use vesper_ecs::Aspect;

use crate::backend::{DrawBackend, Primitive};

const AXIS_COLORS: [(Vec3, Vec4); 3] = [
    (Vec3::X, Vec4::new(1.0, 0.0, 0.0, 1.0)),
    (Vec3::Y, Vec4::new(0.0, 1.0, 0.0, 1.0)),
    (Vec3::Z, Vec4::new(0.0, 0.0, 1.0, 1.0)),
];

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Smallest box holding every point; `None` for no points.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |b, p| Self {
            min: b.min.min(p),
            max: b.max.max(p),
        }))
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// World-space box around this one after `model` is applied.
    pub fn transformed(&self, model: Mat4) -> Self {
        let corners = self.corners().map(|c| model.transform_point3(c));
        let mut out = Self::new(corners[0], corners[0]);
        for c in &corners[1..] {
            out.min = out.min.min(*c);
            out.max = out.max.max(*c);
        }
        out
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// Geometry that can emit itself in object space.
pub trait Mesh: fmt::Debug {
    /// Called with the model matrix already multiplied onto the stack.
    fn emit(&self, ctx: &mut MeshContext<'_>);

    /// Object-space bounds, for culling.
    fn bounds(&self) -> Bounds;

    /// Per-frame hook for animated geometry. Meshes are shared, so state
    /// that changes here lives behind interior mutability.
    fn update(&self, _dt: f32) {}
}

/// Per-draw state handed to [`Mesh::emit`].
pub struct MeshContext<'a> {
    backend: &'a mut dyn DrawBackend,
    model: Mat4,
    normal: Mat4,
    base_color: Vec4,
    lighting: bool,
}

impl<'a> MeshContext<'a> {
    pub fn new(
        backend: &'a mut dyn DrawBackend,
        transform: &Transform,
        base_color: Vec4,
        lighting: bool,
    ) -> Self {
        Self {
            backend,
            model: transform.model_matrix(),
            normal: transform.normal_matrix(),
            base_color,
            lighting,
        }
    }

    pub fn base_color(&self) -> Vec4 {
        self.base_color
    }

    pub fn lighting(&self) -> bool {
        self.lighting
    }

    pub fn begin(&mut self, primitive: Primitive) {
        self.backend.begin(primitive);
    }

    pub fn end(&mut self) {
        self.backend.end();
    }

    pub fn to_world_point(&self, point: Vec3) -> Vec3 {
        self.model.transform_point3(point)
    }

    /// Rotate and scale a normal into world space; translation is ignored.
    pub fn to_world_normal(&self, normal: Vec3) -> Vec3 {
        self.normal.transform_vector3(normal).normalize_or_zero()
    }

    /// Submit one vertex in the base color. Lit draws also submit the
    /// world-space normal for the lighting computation.
    pub fn vertex(&mut self, position: Vec3, normal: Vec3) {
        if self.lighting {
            let world = self.to_world_normal(normal);
            self.backend.normal(world);
        }
        self.backend.color(self.base_color);
        self.backend.vertex(position);
    }

    /// Raw backend access for meshes that manage their own colors.
    pub fn backend(&mut self) -> &mut dyn DrawBackend {
        &mut *self.backend
    }
}

/// Attaches shared geometry to an entity.
#[derive(Debug, Clone)]
pub struct MeshFilter {
    mesh: Rc<dyn Mesh>,
}

impl Aspect for MeshFilter {}

impl MeshFilter {
    pub fn new(mesh: impl Mesh + 'static) -> Self {
        Self {
            mesh: Rc::new(mesh),
        }
    }

    pub fn shared(mesh: Rc<dyn Mesh>) -> Self {
        Self { mesh }
    }

    pub fn mesh(&self) -> &dyn Mesh {
        self.mesh.as_ref()
    }

    /// The shared handle, for identity checks across filters.
    pub fn shared_mesh(&self) -> &Rc<dyn Mesh> {
        &self.mesh
    }
}

/// Flat square in the XY plane facing -Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub half_extent: f32,
}

impl Quad {
    pub fn new(half_extent: f32) -> Self {
        Self { half_extent }
    }
}

impl Default for Quad {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl Mesh for Quad {
    fn emit(&self, ctx: &mut MeshContext<'_>) {
        let s = self.half_extent;
        ctx.begin(Primitive::Quads);
        for corner in [
            Vec3::new(s, s, 0.0),
            Vec3::new(s, -s, 0.0),
            Vec3::new(-s, -s, 0.0),
            Vec3::new(-s, s, 0.0),
        ] {
            ctx.vertex(corner, Vec3::NEG_Z);
        }
        ctx.end();
    }

    fn bounds(&self) -> Bounds {
        let s = self.half_extent.abs();
        Bounds::new(Vec3::new(-s, -s, 0.0), Vec3::new(s, s, 0.0))
    }
}

/// Draw `mesh` under `transform`, leaving the matrix stack as found.
pub fn draw_mesh(
    mesh: &dyn Mesh,
    backend: &mut dyn DrawBackend,
    transform: &Transform,
    base_color: Vec4,
    lighting: bool,
) {
    backend.push_matrix();
    backend.mult_matrix(transform.model_matrix());
    let mut ctx = MeshContext::new(backend, transform, base_color, lighting);
    mesh.emit(&mut ctx);
    backend.pop_matrix();
}

/// Unit axis lines (X red, Y green, Z blue) for renderers without geometry.
pub fn draw_axis_gizmo(backend: &mut dyn DrawBackend, model: Mat4) {
    backend.push_matrix();
    backend.mult_matrix(model);
    backend.begin(Primitive::Lines);
    for (axis, color) in AXIS_COLORS {
        backend.color(color);
        backend.vertex(Vec3::ZERO);
        backend.vertex(axis);
    }
    backend.end();
    backend.pop_matrix();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DrawCommand, RecordingBackend};
    use glam::Quat;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn quad_draws_inside_a_pushed_model_matrix() {
        let mut backend = RecordingBackend::new();
        let transform = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        draw_mesh(&Quad::new(1.0), &mut backend, &transform, Vec4::ONE, false);

        let commands = backend.commands();
        assert_eq!(commands[0], DrawCommand::PushMatrix);
        assert_eq!(commands[1], DrawCommand::MultMatrix(transform.model_matrix()));
        assert_eq!(commands[2], DrawCommand::Begin(Primitive::Quads));
        assert_eq!(commands.last(), Some(&DrawCommand::PopMatrix));
        assert_eq!(backend.vertex_count(), 4);
        assert_eq!(backend.count(|c| matches!(c, DrawCommand::Normal(_))), 0);
        assert!(backend.is_balanced());
    }

    #[test]
    fn lit_vertices_carry_world_normals() {
        let mut backend = RecordingBackend::new();
        let transform = Transform {
            rotation: Quat::from_rotation_y(FRAC_PI_2),
            ..Transform::default()
        };
        let color = Vec4::new(0.2, 0.4, 0.6, 1.0);
        draw_mesh(&Quad::default(), &mut backend, &transform, color, true);

        let normals: Vec<Vec3> = backend
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Normal(n) => Some(*n),
                _ => None,
            })
            .collect();
        assert_eq!(normals.len(), 4);
        // -Z turned a quarter about Y faces -X
        assert!(normals.iter().all(|n| n.abs_diff_eq(Vec3::NEG_X, 1e-5)));
        assert_eq!(backend.count(|c| *c == DrawCommand::Color(color)), 4);
    }

    #[test]
    fn world_point_applies_full_model() {
        let mut backend = RecordingBackend::new();
        let transform = Transform {
            position: Vec3::new(0.0, 0.0, 5.0),
            scale: Vec3::splat(2.0),
            ..Transform::default()
        };
        let ctx = MeshContext::new(&mut backend, &transform, Vec4::ONE, false);
        assert_eq!(ctx.to_world_point(Vec3::X), Vec3::new(2.0, 0.0, 5.0));
        assert_eq!(ctx.to_world_normal(Vec3::X), Vec3::X);
    }

    #[test]
    fn gizmo_emits_three_colored_axes() {
        let mut backend = RecordingBackend::new();
        draw_axis_gizmo(&mut backend, Mat4::IDENTITY);
        assert_eq!(backend.vertex_count(), 6);
        assert_eq!(backend.count(|c| matches!(c, DrawCommand::Color(_))), 3);
        assert!(
            backend
                .commands()
                .contains(&DrawCommand::Color(Vec4::new(0.0, 0.0, 1.0, 1.0)))
        );
        assert!(backend.is_balanced());
    }

    #[test]
    fn quad_bounds_follow_the_model_matrix() {
        let quad = Quad::new(1.0);
        let local = quad.bounds();
        assert_eq!(local.min, Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(local.max, Vec3::new(1.0, 1.0, 0.0));
        assert!(local.contains(Vec3::ZERO));

        let transform = Transform {
            position: Vec3::new(10.0, 0.0, 0.0),
            rotation: Quat::from_rotation_y(FRAC_PI_2),
            scale: Vec3::splat(2.0),
        };
        let world = local.transformed(transform.model_matrix());
        // a quarter turn about Y swaps the flat axis from Z to X
        assert!(world.min.abs_diff_eq(Vec3::new(10.0, -2.0, -2.0), 1e-5));
        assert!(world.max.abs_diff_eq(Vec3::new(10.0, 2.0, 2.0), 1e-5));
        assert!(world.center().abs_diff_eq(Vec3::new(10.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn bounds_from_points() {
        assert!(Bounds::from_points(std::iter::empty()).is_none());
        let b = Bounds::from_points([Vec3::new(1.0, -2.0, 0.0), Vec3::new(-1.0, 3.0, 5.0)]).unwrap();
        assert_eq!(b.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(b.max, Vec3::new(1.0, 3.0, 5.0));
        assert!(!b.contains(Vec3::new(0.0, 0.0, 6.0)));
        assert_eq!(Bounds::new(b.max, b.min), b);
    }

    #[test]
    fn filters_share_geometry() {
        let mesh: Rc<dyn Mesh> = Rc::new(Quad::new(2.0));
        let a = MeshFilter::shared(Rc::clone(&mesh));
        let b = a.clone();
        assert_eq!(Rc::strong_count(&mesh), 3);
        assert!(format!("{:?}", b.mesh()).contains("2.0"));
    }
}
