use crate::renderer::RenderView;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Automatic camera fly-around, a pure function of simulation time.
///
/// The eye circles the origin at `angular_speed` rad/s while its distance and
/// height breathe slowly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitPath {
    pub angular_speed: f32,
    pub base_radius: f32,
    pub radius_wobble: f32,
    pub radius_frequency: f32,
    pub base_height: f32,
    pub height_wobble: f32,
    pub height_frequency: f32,
    pub fov_degrees: f32,
}

impl Default for OrbitPath {
    fn default() -> Self {
        Self {
            angular_speed: 0.05,
            base_radius: 80.0,
            radius_wobble: 10.0,
            radius_frequency: 0.1,
            base_height: 20.0,
            height_wobble: 5.0,
            height_frequency: 0.15,
            fov_degrees: 50.0,
        }
    }
}

impl OrbitPath {
    /// Horizontal distance from the origin at `time`.
    pub fn radius_at(&self, time: f64) -> f32 {
        let t = time as f32;
        self.base_radius + self.radius_wobble * (t * self.radius_frequency).sin()
    }

    /// Orbit angle, height and radius at `time`.
    pub fn polar_at(&self, time: f64) -> (f32, f32, f32) {
        let t = time as f32;
        let angle = t * self.angular_speed;
        let height = self.base_height + self.height_wobble * (t * self.height_frequency).cos();
        (angle, height, self.radius_at(time))
    }

    pub fn eye_at(&self, time: f64) -> Vec3 {
        let (angle, height, radius) = self.polar_at(time);
        Vec3::new(angle.cos() * radius, height, angle.sin() * radius)
    }

    /// Full view looking at the origin.
    pub fn view_at(&self, time: f64) -> RenderView {
        RenderView {
            eye: self.eye_at(time),
            target: Vec3::ZERO,
            fov_degrees: self.fov_degrees,
            ..RenderView::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_positive_x() {
        let eye = OrbitPath::default().eye_at(0.0);
        assert!((eye - Vec3::new(80.0, 25.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn radius_and_height_stay_in_band() {
        let path = OrbitPath::default();
        for i in 0..2000 {
            let t = i as f64 * 0.37;
            let eye = path.eye_at(t);
            let horizontal = Vec3::new(eye.x, 0.0, eye.z).length();
            assert!((70.0 - 1e-3..=90.0 + 1e-3).contains(&horizontal));
            assert!((15.0 - 1e-3..=25.0 + 1e-3).contains(&eye.y));
        }
    }

    #[test]
    fn view_targets_origin() {
        let view = OrbitPath::default().view_at(12.5);
        assert_eq!(view.target, Vec3::ZERO);
        assert_eq!(view.fov_degrees, 50.0);
        assert_eq!(view.far, 2000.0);
    }

    #[test]
    fn angle_advances_with_time() {
        let path = OrbitPath::default();
        let (a0, _, _) = path.polar_at(0.0);
        let (a1, _, _) = path.polar_at(10.0);
        assert!((a1 - a0 - 0.5).abs() < 1e-6);
    }
}
