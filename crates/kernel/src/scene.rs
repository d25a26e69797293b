use electric_common::{InstanceTransform, SurfaceStyle};
use electric_curve::CurveError;
use electric_placer::PlacementError;
use glam::{EulerRot, Quat, Vec3};
use std::f64::consts::TAU;

use crate::clock::{ClockError, FrameClock};
use crate::config::{CoreCubeConfig, SceneConfig};
use crate::ring::Ring;

/// Errors from building or configuring a scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("ring `{ring}`: {source}")]
    Curve {
        ring: String,
        #[source]
        source: CurveError,
    },
    #[error("ring `{ring}`: {source}")]
    Placement {
        ring: String,
        #[source]
        source: PlacementError,
    },
    #[error("clock: {0}")]
    Clock(#[from] ClockError),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Orientation of the core cube at `time`: independent spins about X, Y, Z.
fn core_rotation(spin: Vec3, time: f64) -> Quat {
    let angle = |rate: f32| (rate as f64 * time).rem_euclid(TAU) as f32;
    Quat::from_euler(EulerRot::XYZ, angle(spin.x), angle(spin.y), angle(spin.z))
}

/// The animated scene: one clock, the core cube, and the rings.
///
/// The host calls [`ElectricScene::tick`] once per frame. The tick always
/// runs in the same order (clock, rings in config order, core cube), so two
/// scenes fed the same deltas are identical.
#[derive(Debug, Clone)]
pub struct ElectricScene {
    config: SceneConfig,
    clock: FrameClock,
    rings: Vec<Ring>,
    core: InstanceTransform,
    paused: bool,
    time_scale: f64,
}

impl ElectricScene {
    pub fn new(config: SceneConfig) -> Result<Self, SceneError> {
        config.validate()?;
        let clock = FrameClock::new(config.max_step)?;
        let rings = config
            .rings
            .iter()
            .map(Ring::from_config)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(
            rings = rings.len(),
            instances = config.total_instances(),
            max_step = config.max_step,
            "scene built"
        );

        let mut scene = Self {
            core: InstanceTransform {
                scale: config.core.size,
                ..InstanceTransform::default()
            },
            config,
            clock,
            rings,
            paused: false,
            time_scale: 1.0,
        };
        scene.update_core();
        Ok(scene)
    }

    /// Advance one frame and recompute every instance.
    /// Returns the simulated step actually taken.
    pub fn tick(&mut self, raw_delta: f64) -> f64 {
        let _span = tracing::trace_span!("scene_tick").entered();
        let requested = if self.paused {
            0.0
        } else {
            raw_delta * self.time_scale
        };
        let step = self.clock.advance(requested);
        let time = self.clock.time();

        for ring in &mut self.rings {
            ring.place(time);
        }
        self.update_core();

        tracing::trace!(time, step, "tick complete");
        step
    }

    /// Back to time zero with every instance at its starting slot.
    pub fn reset(&mut self) {
        self.clock.reset();
        for ring in &mut self.rings {
            ring.place(0.0);
        }
        self.update_core();
        tracing::info!("scene reset");
    }

    fn update_core(&mut self) {
        self.core.rotation = core_rotation(self.config.core.spin, self.clock.time());
    }

    pub fn time(&self) -> f64 {
        self.clock.time()
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    pub fn ring(&self, name: &str) -> Option<&Ring> {
        self.rings.iter().find(|r| r.name() == name)
    }

    /// Transform of the core cube; its scale is the cube's edge length.
    pub fn core_cube(&self) -> InstanceTransform {
        self.core
    }

    pub fn core_style(&self) -> &SurfaceStyle {
        &self.config.core.style
    }

    pub fn core_config(&self) -> &CoreCubeConfig {
        &self.config.core
    }

    /// Ring instances plus the core cube.
    pub fn instance_count(&self) -> usize {
        self.rings.iter().map(Ring::len).sum::<usize>() + 1
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Multiplier applied to raw deltas before clamping. Negative or
    /// non-finite values are ignored.
    pub fn set_time_scale(&mut self, scale: f64) {
        if scale.is_finite() && scale >= 0.0 {
            self.time_scale = scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RingConfig;
    use electric_placer::instance_transform;

    #[test]
    fn default_scene_has_all_rings() {
        let scene = ElectricScene::new(SceneConfig::default()).unwrap();
        assert_eq!(scene.rings().len(), 3);
        assert_eq!(scene.instance_count(), 261);
        assert_eq!(scene.ring("upper").map(Ring::len), Some(80));
        assert!(scene.ring("missing").is_none());
        assert_eq!(scene.core_cube().scale, 45.0);
    }

    #[test]
    fn tick_places_rings_at_clock_time() {
        let mut scene = ElectricScene::new(SceneConfig::default()).unwrap();
        for _ in 0..30 {
            scene.tick(1.0 / 60.0);
        }
        let time = scene.time();
        let ring = scene.ring("central").unwrap();
        let expected = instance_transform(ring.placer().sampler(), ring.placer().params(), 5, time);
        assert_eq!(ring.states()[5].transform, expected);
    }

    #[test]
    fn tick_clamps_long_frames() {
        let mut scene = ElectricScene::new(SceneConfig::default()).unwrap();
        assert_eq!(scene.tick(3.0), 0.05);
        assert_eq!(scene.time(), 0.05);
    }

    #[test]
    fn paused_scene_holds_still() {
        let mut scene = ElectricScene::new(SceneConfig::default()).unwrap();
        scene.tick(0.016);
        scene.set_paused(true);
        let before = scene.ring("lower").unwrap().states()[0];
        assert_eq!(scene.tick(0.016), 0.0);
        assert_eq!(scene.ring("lower").unwrap().states()[0], before);
    }

    #[test]
    fn time_scale_speeds_up_simulation() {
        let mut scene = ElectricScene::new(SceneConfig::default()).unwrap();
        scene.set_time_scale(2.0);
        scene.tick(0.01);
        assert!((scene.time() - 0.02).abs() < 1e-12);
        scene.set_time_scale(-1.0);
        assert_eq!(scene.time_scale(), 2.0);
    }

    #[test]
    fn reset_restores_initial_layout() {
        let fresh = ElectricScene::new(SceneConfig::default()).unwrap();
        let mut scene = fresh.clone();
        for _ in 0..100 {
            scene.tick(0.02);
        }
        scene.reset();
        assert_eq!(scene.time(), 0.0);
        assert_eq!(scene.rings()[0].states(), fresh.rings()[0].states());
        assert_eq!(scene.core_cube(), fresh.core_cube());
    }

    #[test]
    fn same_deltas_give_same_scene() {
        let mut a = ElectricScene::new(SceneConfig::default()).unwrap();
        let mut b = ElectricScene::new(SceneConfig::default()).unwrap();
        for k in 0..200 {
            let dt = 0.01 + (k % 7) as f64 * 0.003;
            a.tick(dt);
            b.tick(dt);
        }
        for (ra, rb) in a.rings().iter().zip(b.rings()) {
            assert_eq!(ra.states(), rb.states());
        }
    }

    #[test]
    fn core_cube_spins() {
        let mut scene = ElectricScene::new(SceneConfig::default()).unwrap();
        let start = scene.core_cube().rotation;
        scene.tick(0.05);
        assert!(scene.core_cube().rotation.dot(start).abs() < 1.0 - 1e-6);
        assert_eq!(scene.core_cube().position, Vec3::ZERO);
    }

    #[test]
    fn empty_ring_is_allowed() {
        let config = SceneConfig {
            rings: vec![RingConfig {
                count: 0,
                ..RingConfig::central()
            }],
            ..SceneConfig::default()
        };
        let mut scene = ElectricScene::new(config).unwrap();
        scene.tick(0.016);
        assert!(scene.rings()[0].is_empty());
        assert_eq!(scene.instance_count(), 1);
    }

    #[test]
    fn invalid_config_fails_to_build() {
        let config = SceneConfig {
            max_step: f64::NAN,
            ..SceneConfig::default()
        };
        assert!(ElectricScene::new(config).is_err());
    }
}
