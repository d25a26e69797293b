use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Spatial transform of one instance: position, rotation, uniform scale.
///
/// Produced fresh every frame; never aliased between instances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstanceTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f32,
}

impl Default for InstanceTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: 1.0,
        }
    }
}

impl InstanceTransform {
    /// Column-major model matrix (scale, then rotate, then translate).
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), self.rotation, self.position)
    }

    /// True when every component is finite.
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite() && self.scale.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_default_is_identity() {
        let t = InstanceTransform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, 1.0);
        assert_eq!(t.to_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn matrix_applies_uniform_scale_then_translation() {
        let t = InstanceTransform {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::IDENTITY,
            scale: 2.0,
        };
        let p = t.to_matrix().transform_point3(Vec3::new(0.5, 0.0, 0.0));
        assert!((p - Vec3::new(2.0, 2.0, 3.0)).length() < 1e-6);
    }

    #[test]
    fn nan_scale_is_not_finite() {
        let t = InstanceTransform {
            scale: f32::NAN,
            ..InstanceTransform::default()
        };
        assert!(!t.is_finite());
    }
}
