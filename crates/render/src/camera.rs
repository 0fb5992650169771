use glam::{EulerRot, Mat4, Quat, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use vesper_common::EntityId;
use vesper_ecs::Aspect;
use vesper_input::{InputSource, Key};

use crate::backend::{Capability, DirectionalLight, DrawBackend, Primitive};
use crate::error::RenderError;
use crate::layers::LayerMask;
use crate::pass::RenderContext;

const LIGHT_DIFFUSE: Vec4 = Vec4::new(1.0, 1.0, 0.0, 1.0);
const LIGHT_AMBIENT: Vec4 = Vec4::new(0.0, 0.0, 0.0, 1.0);
const LIGHT_GUIDE_LENGTH: f32 = 100.0;

/// How a camera maps view space to clip space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Projection {
    /// Pixel-aligned, origin at the top-left of the viewport.
    Orthographic,
    Perspective { fov_degrees: f32 },
}

/// Construction-time camera parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub projection: Projection,
    pub width: f32,
    pub height: f32,
    pub near: f32,
    pub far: f32,
    pub layers: LayerMask,
    pub alpha_blend: bool,
    pub lighting: bool,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            projection: Projection::Perspective { fov_degrees: 60.0 },
            width: 800.0,
            height: 600.0,
            near: 0.1,
            far: 256.0,
            layers: LayerMask::default(),
            alpha_blend: false,
            lighting: false,
        }
    }
}

impl CameraSettings {
    pub fn orthographic(width: f32, height: f32) -> Self {
        Self {
            projection: Projection::Orthographic,
            width,
            height,
            ..Self::default()
        }
    }

    pub fn perspective(width: f32, height: f32, fov_degrees: f32) -> Self {
        Self {
            projection: Projection::Perspective { fov_degrees },
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_layers(mut self, layers: LayerMask) -> Self {
        self.layers = layers;
        self
    }

    pub fn with_alpha_blend(mut self, alpha_blend: bool) -> Self {
        self.alpha_blend = alpha_blend;
        self
    }

    pub fn with_lighting(mut self, lighting: bool) -> Self {
        self.lighting = lighting;
        self
    }
}

/// Keyboard and mouse navigation state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Freelook {
    pub enabled: bool,
    /// World units per second.
    pub move_speed: f32,
    /// Radians per pixel of cursor travel.
    pub rotate_speed: f32,
    #[serde(skip)]
    last_cursor: Option<Vec2>,
}

impl Default for Freelook {
    fn default() -> Self {
        Self {
            enabled: false,
            move_speed: 10.0,
            rotate_speed: 0.005,
            last_cursor: None,
        }
    }
}

impl Freelook {
    /// Enabled navigation with the given speeds.
    pub fn with_speeds(move_speed: f32, rotate_speed: f32) -> Self {
        Self {
            enabled: true,
            move_speed,
            rotate_speed,
            last_cursor: None,
        }
    }

    /// Cursor position sampled at the end of the last update.
    pub fn last_cursor(&self) -> Option<Vec2> {
        self.last_cursor
    }
}

/// A view into the scene, attached to an entity as an aspect.
///
/// Projection kind, layers and the blend/lighting flags are fixed at
/// construction; only the viewport size may change afterwards. Orientation is
/// kept as per-axis angles in radians and composed Z first, then X, then Y.
#[derive(Debug, Clone)]
pub struct Camera {
    settings: CameraSettings,
    pub position: Vec3,
    pub angles: Vec3,
    pub freelook: Freelook,
}

impl Aspect for Camera {}

impl Camera {
    pub fn new(settings: CameraSettings) -> Self {
        Self {
            settings,
            position: Vec3::ZERO,
            angles: Vec3::ZERO,
            freelook: Freelook::default(),
        }
    }

    pub fn orthographic(width: f32, height: f32) -> Self {
        Self::new(CameraSettings::orthographic(width, height))
    }

    pub fn perspective(width: f32, height: f32, fov_degrees: f32) -> Self {
        Self::new(CameraSettings::perspective(width, height, fov_degrees))
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    pub fn is_orthographic(&self) -> bool {
        matches!(self.settings.projection, Projection::Orthographic)
    }

    pub fn is_perspective(&self) -> bool {
        !self.is_orthographic()
    }

    pub fn layers(&self) -> LayerMask {
        self.settings.layers
    }

    pub fn uses_alpha_blend(&self) -> bool {
        self.settings.alpha_blend
    }

    pub fn uses_lighting(&self) -> bool {
        self.settings.lighting
    }

    /// Follow a viewport resize. Zero-sized viewports (minimised windows)
    /// are ignored.
    pub fn resize(&mut self, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 {
            tracing::debug!(width, height, "ignoring degenerate viewport");
            return;
        }
        self.settings.width = width;
        self.settings.height = height;
    }

    pub fn projection_matrix(&self) -> Mat4 {
        let CameraSettings {
            width,
            height,
            near,
            far,
            ..
        } = self.settings;
        match self.settings.projection {
            Projection::Orthographic => Mat4::orthographic_rh_gl(0.0, width, height, 0.0, near, far),
            Projection::Perspective { fov_degrees } => {
                screen_flip() * self.perspective_matrix(fov_degrees)
            }
        }
    }

    fn perspective_matrix(&self, fov_degrees: f32) -> Mat4 {
        let s = &self.settings;
        Mat4::perspective_rh_gl(fov_degrees.to_radians(), s.width / s.height, s.near, s.far)
    }

    pub fn translation_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
    }

    pub fn rotation_matrix(&self) -> Mat4 {
        Mat4::from_rotation_y(self.angles.y)
            * Mat4::from_rotation_x(self.angles.x)
            * Mat4::from_rotation_z(self.angles.z)
    }

    /// The angles as a quaternion, composed in the same order as
    /// [`Camera::rotation_matrix`].
    pub fn orientation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.angles.y, self.angles.x, self.angles.z)
    }

    pub fn set_orientation(&mut self, rotation: Quat) {
        let (y, x, z) = rotation.to_euler(EulerRot::YXZ);
        self.angles = Vec3::new(x, y, z);
    }

    /// Camera pose in world space: rotate, then translate.
    pub fn view_matrix(&self) -> Mat4 {
        self.translation_matrix() * self.rotation_matrix()
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation_matrix().transform_vector3(Vec3::NEG_Z)
    }

    pub fn right(&self) -> Vec3 {
        self.rotation_matrix().transform_vector3(Vec3::NEG_X)
    }

    pub fn up(&self) -> Vec3 {
        self.rotation_matrix().transform_vector3(Vec3::NEG_Y)
    }

    /// Translate along the camera's local axes. Positive amounts move
    /// against the local X/Y/Z axes.
    pub fn move_by(&mut self, x: f32, y: f32, z: f32) {
        let rotation = self.rotation_matrix();
        self.position -= rotation.transform_vector3(Vec3::X) * x;
        self.position -= rotation.transform_vector3(Vec3::Y) * y;
        self.position -= rotation.transform_vector3(Vec3::Z) * z;
    }

    /// Subtract per-axis angle increments, in radians.
    pub fn rotate(&mut self, x: f32, y: f32, z: f32) {
        self.angles -= Vec3::new(x, y, z);
    }

    /// Advance the freelook controller by one frame.
    ///
    /// Mouse look only runs while the cursor is hidden and the window has
    /// focus; it re-centres the cursor after reading it.
    pub fn update(&mut self, input: &mut dyn InputSource, dt: f32) {
        if !self.freelook.enabled {
            return;
        }

        let amount = dt * self.freelook.move_speed;
        let mut step = Vec3::ZERO;
        if input.is_down(Key::W) {
            step.z += amount;
        }
        if input.is_down(Key::S) {
            step.z -= amount;
        }
        if input.is_down(Key::A) {
            step.x -= amount;
        }
        if input.is_down(Key::D) {
            step.x += amount;
        }
        if input.is_down(Key::Q) {
            step.y += amount;
        }
        if input.is_down(Key::E) {
            step.y -= amount;
        }
        if step != Vec3::ZERO {
            self.move_by(step.x, step.y, step.z);
        }

        if !input.cursor_visible() && input.focused() {
            if let Some(last) = self.freelook.last_cursor {
                let delta = last - input.cursor_position();
                let speed = self.freelook.rotate_speed;
                // horizontal travel turns about Y, vertical about X
                self.rotate(delta.y * speed, delta.x * speed, 0.0);
            }
            input.center_cursor();
        }
        self.freelook.last_cursor = Some(input.cursor_position());
    }

    /// Open this camera's render bracket.
    ///
    /// `view` is the camera's world pose; its inverse becomes the modelview
    /// base. Marks the camera as current in `ctx`.
    pub fn begin(
        &self,
        id: EntityId,
        ctx: &mut RenderContext,
        backend: &mut dyn DrawBackend,
        view: Mat4,
    ) -> Result<(), RenderError> {
        ctx.open_bracket(id)?;

        backend.load_projection(self.projection_matrix());
        backend.push_matrix();
        backend.load_matrix(view.inverse());

        if self.settings.alpha_blend {
            backend.enable(Capability::Blend);
        }
        if self.settings.lighting {
            let t = ctx.elapsed();
            let direction = Vec3::new(t.cos(), t.sin(), 0.0);

            backend.enable(Capability::CullFace);
            backend.begin(Primitive::Lines);
            backend.color(LIGHT_DIFFUSE);
            backend.vertex(Vec3::ZERO);
            backend.vertex(direction * LIGHT_GUIDE_LENGTH);
            backend.end();

            backend.enable(Capability::Lighting);
            backend.enable(Capability::ColorMaterial);
            backend.set_light(DirectionalLight {
                direction,
                diffuse: LIGHT_DIFFUSE,
                ambient: LIGHT_AMBIENT,
            });
        }
        Ok(())
    }

    /// Close the bracket opened by [`Camera::begin`], reverting exactly the
    /// state it set.
    pub fn end(&self, ctx: &mut RenderContext, backend: &mut dyn DrawBackend) -> Result<(), RenderError> {
        ctx.close_bracket()?;

        backend.pop_matrix();
        if self.settings.alpha_blend {
            backend.disable(Capability::Blend);
        }
        if self.settings.lighting {
            backend.disable(Capability::Lighting);
            backend.disable(Capability::ColorMaterial);
            backend.disable(Capability::CullFace);
        }
        Ok(())
    }
}

/// Negates X and Y so clip space matches screen coordinates.
fn screen_flip() -> Mat4 {
    Mat4::from_scale(Vec3::new(-1.0, -1.0, 1.0))
}
