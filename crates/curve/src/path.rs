use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::sampler::{CurveError, CurveKind, CurveSampler};

/// Wavy horizontal loop around the origin.
///
/// Sample `i` sits at angle `a = 2π i / samples`:
/// `(cos a · r, offset + sin 3a · hv + cos 2a · hv / 2, sin a · r)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopPath {
    pub radius: f32,
    pub height_variation: f32,
    pub height_offset: f32,
    pub samples: usize,
}

impl Default for LoopPath {
    fn default() -> Self {
        Self {
            radius: 120.0,
            height_variation: 40.0,
            height_offset: 0.0,
            samples: 200,
        }
    }
}

impl LoopPath {
    /// Same loop shifted vertically.
    pub fn with_offset(height_offset: f32) -> Self {
        Self {
            height_offset,
            ..Self::default()
        }
    }

    /// Control points, without repeating the first one at the end.
    pub fn control_points(&self) -> Vec<Vec3> {
        (0..self.samples)
            .map(|i| {
                let angle = i as f32 / self.samples as f32 * TAU;
                let y = self.height_offset
                    + (angle * 3.0).sin() * self.height_variation
                    + (angle * 2.0).cos() * self.height_variation * 0.5;
                Vec3::new(angle.cos() * self.radius, y, angle.sin() * self.radius)
            })
            .collect()
    }

    /// Build a sampler over this loop.
    pub fn build(&self, kind: CurveKind) -> Result<CurveSampler, CurveError> {
        CurveSampler::build_with(&self.control_points(), kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_loop_matches_scene_dimensions() {
        let path = LoopPath::default();
        let points = path.control_points();
        assert_eq!(points.len(), 200);
        // angle 0: sin 0 = 0, cos 0 = 1 -> y = hv / 2
        assert!((points[0] - Vec3::new(120.0, 20.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn points_lie_on_cylinder() {
        for p in LoopPath::with_offset(35.0).control_points() {
            let r = (p.x * p.x + p.z * p.z).sqrt();
            assert!((r - 120.0).abs() < 1e-3);
            assert!(p.y >= 35.0 - 60.0 && p.y <= 35.0 + 60.0);
        }
    }

    #[test]
    fn offset_shifts_every_point() {
        let flat = LoopPath::default().control_points();
        let raised = LoopPath::with_offset(-35.0).control_points();
        for (a, b) in flat.iter().zip(&raised) {
            assert!((a.y - 35.0 - b.y).abs() < 1e-4);
        }
    }

    #[test]
    fn too_few_samples_fail_to_build() {
        let path = LoopPath {
            samples: 2,
            ..LoopPath::default()
        };
        assert!(matches!(
            path.build(CurveKind::default()),
            Err(CurveError::TooFewPoints { got: 2 })
        ));
    }

    #[test]
    fn built_loop_stays_near_cylinder() {
        let curve = LoopPath::default().build(CurveKind::Centripetal).unwrap();
        for k in 0..500 {
            let p = curve.position_at(k as f64 / 500.0);
            let r = (p.x * p.x + p.z * p.z).sqrt();
            assert!((r - 120.0).abs() < 0.5);
        }
    }
}
