use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for an entity.
///
/// Ids are handed out by the registry from a monotonically increasing counter
/// and are never reissued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn translation_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
    }

    pub fn rotation_matrix(&self) -> Mat4 {
        Mat4::from_quat(self.rotation)
    }

    pub fn scaling_matrix(&self) -> Mat4 {
        Mat4::from_scale(self.scale)
    }

    /// Object-to-world matrix: scaled, then rotated, then positioned.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Matrix used to carry object-space normals into world space.
    ///
    /// Rotation and scale only; translation never applies to directions.
    pub fn normal_matrix(&self) -> Mat4 {
        self.rotation_matrix() * self.scaling_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_display() {
        assert_eq!(EntityId(7).to_string(), "#7");
        assert_eq!(EntityId(7).raw(), 7);
    }

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
        assert!(t.model_matrix().abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn model_matrix_scales_then_rotates_then_translates() {
        let t = Transform {
            position: Vec3::new(10.0, 0.0, 0.0),
            rotation: Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            scale: Vec3::splat(2.0),
        };
        // (1,0,0) -> scale (2,0,0) -> rotate (0,2,0) -> translate (10,2,0)
        let p = t.model_matrix().transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(10.0, 2.0, 0.0), 1e-5));

        let composed = t.translation_matrix() * t.rotation_matrix() * t.scaling_matrix();
        assert!(composed.abs_diff_eq(t.model_matrix(), 1e-5));
    }

    #[test]
    fn normal_matrix_ignores_translation() {
        let t = Transform::from_position(Vec3::new(5.0, 5.0, 5.0));
        let n = t.normal_matrix().transform_vector3(Vec3::Y);
        assert!(n.abs_diff_eq(Vec3::Y, 1e-6));
    }
}
