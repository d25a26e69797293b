//! Scene configuration. Defaults give the stock electric-cubes look;
//! any field can be overridden from a YAML file.

use electric_common::{Rgb, SurfaceStyle};
use electric_curve::{CurveKind, LoopPath};
use electric_placer::{HueWave, PlacementParams};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::clock::DEFAULT_MAX_STEP;
use crate::scene::SceneError;

/// Upper bound on instances per ring; keeps a typo in a config file from
/// allocating gigabytes.
pub const MAX_RING_INSTANCES: usize = 100_000;

/// Upper bound on control points generated for one ring's loop.
pub const MAX_PATH_SAMPLES: usize = 100_000;

/// One ring of cubes following its own loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingConfig {
    pub name: String,
    pub count: usize,
    #[serde(default)]
    pub path: LoopPath,
    #[serde(default)]
    pub curve: CurveKind,
    #[serde(default)]
    pub placement: PlacementParams,
    #[serde(default)]
    pub style: SurfaceStyle,
}

impl RingConfig {
    /// Blue ring at the height of the core cube.
    pub fn central() -> Self {
        Self {
            name: "central".into(),
            count: 100,
            path: LoopPath::default(),
            curve: CurveKind::Centripetal,
            placement: PlacementParams::default(),
            style: SurfaceStyle::default(),
        }
    }

    /// Purple ring 35 units above the central one.
    pub fn upper() -> Self {
        Self {
            name: "upper".into(),
            count: 80,
            path: LoopPath::with_offset(35.0),
            curve: CurveKind::Centripetal,
            placement: PlacementParams {
                base_speed: 0.25,
                speed_variance: 0.08,
                speed_variation_frequency: 0.06,
                phase_step: 0.0125,
                scale_base: 0.5,
                scale_amplitude: 0.25,
                scale_pulse_frequency: 3.5,
                scale_phase_step: 0.6,
                spin_rate: 1.0,
                spin_phase_step: 0.25,
                colors: HueWave {
                    base_hue: 0.75,
                    amplitude: 0.1,
                    frequency: 0.15,
                    ..HueWave::default()
                },
            },
            style: SurfaceStyle {
                base: Rgb::from_hex(0x1a0033),
                emissive: Rgb::from_hex(0x8a2be2),
                emissive_intensity: 2.0,
            },
        }
    }

    /// Violet ring 35 units below the central one.
    pub fn lower() -> Self {
        let upper = Self::upper();
        Self {
            name: "lower".into(),
            path: LoopPath::with_offset(-35.0),
            placement: PlacementParams {
                base_speed: 0.22,
                speed_variance: 0.06,
                scale_pulse_frequency: 3.2,
                spin_rate: 0.9,
                colors: HueWave {
                    base_hue: 0.8,
                    amplitude: 0.08,
                    ..upper.placement.colors
                },
                ..upper.placement
            },
            style: SurfaceStyle {
                emissive: Rgb::from_hex(0x9932cc),
                ..upper.style
            },
            ..upper
        }
    }
}

/// The large cube spinning at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreCubeConfig {
    pub size: f32,
    /// Angular velocity about X, Y, Z in radians per simulated second.
    pub spin: Vec3,
    pub style: SurfaceStyle,
}

impl Default for CoreCubeConfig {
    fn default() -> Self {
        Self {
            size: 45.0,
            spin: Vec3::new(0.3, 0.48, 0.18),
            style: SurfaceStyle {
                base: Rgb::from_hex(0x002244),
                emissive: Rgb::from_hex(0x00aaff),
                emissive_intensity: 3.0,
            },
        }
    }
}

/// Everything needed to build an [`crate::ElectricScene`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Ceiling for one frame's simulated step, in seconds.
    pub max_step: f64,
    pub core: CoreCubeConfig,
    /// Rings in tick order.
    pub rings: Vec<RingConfig>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            max_step: DEFAULT_MAX_STEP,
            core: CoreCubeConfig::default(),
            rings: vec![RingConfig::central(), RingConfig::upper(), RingConfig::lower()],
        }
    }
}

impl SceneConfig {
    /// Read and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&text)?;
        tracing::debug!(path = %path.display(), rings = config.rings.len(), "scene config loaded");
        Ok(config)
    }

    /// Parse and validate YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, SceneError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, SceneError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    /// Structural checks that do not need to build any curve.
    pub fn validate(&self) -> Result<(), SceneError> {
        if !(self.max_step.is_finite() && self.max_step > 0.0) {
            return Err(SceneError::InvalidConfig(format!(
                "max_step must be positive and finite, got {}",
                self.max_step
            )));
        }
        if !(self.core.size.is_finite() && self.core.spin.is_finite()) {
            return Err(SceneError::InvalidConfig("core cube values must be finite".into()));
        }

        let mut names = BTreeSet::new();
        for ring in &self.rings {
            if ring.name.is_empty() {
                return Err(SceneError::InvalidConfig("ring name must not be empty".into()));
            }
            if !names.insert(ring.name.as_str()) {
                return Err(SceneError::InvalidConfig(format!(
                    "duplicate ring name `{}`",
                    ring.name
                )));
            }
            if ring.count > MAX_RING_INSTANCES {
                return Err(SceneError::InvalidConfig(format!(
                    "ring `{}` has {} instances, limit is {MAX_RING_INSTANCES}",
                    ring.name, ring.count
                )));
            }
            let path = &ring.path;
            if path.samples > MAX_PATH_SAMPLES {
                return Err(SceneError::InvalidConfig(format!(
                    "ring `{}` path has {} samples, limit is {MAX_PATH_SAMPLES}",
                    ring.name, path.samples
                )));
            }
            if !(path.radius.is_finite()
                && path.height_variation.is_finite()
                && path.height_offset.is_finite())
            {
                return Err(SceneError::InvalidConfig(format!(
                    "ring `{}` path dimensions must be finite",
                    ring.name
                )));
            }
            ring.curve.validate().map_err(|source| SceneError::Curve {
                ring: ring.name.clone(),
                source,
            })?;
            ring.placement
                .validate()
                .map_err(|source| SceneError::Placement {
                    ring: ring.name.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    pub fn total_instances(&self) -> usize {
        self.rings.iter().map(|r| r.count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use electric_curve::CurveError;

    #[test]
    fn default_has_three_rings() {
        let config = SceneConfig::default();
        let names: Vec<&str> = config.rings.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["central", "upper", "lower"]);
        assert_eq!(config.total_instances(), 260);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn lower_ring_preset_values() {
        let lower = RingConfig::lower();
        assert_eq!(lower.count, 80);
        assert_eq!(lower.path.height_offset, -35.0);
        assert_eq!(lower.placement.base_speed, 0.22);
        assert_eq!(lower.placement.phase_step, 0.0125);
        assert_eq!(lower.placement.scale_phase_step, 0.6);
        assert_eq!(lower.placement.colors.frequency, 0.15);
        assert_eq!(lower.style.base, Rgb::from_hex(0x1a0033));
    }

    #[test]
    fn yaml_round_trip() {
        let config = SceneConfig::default();
        let text = config.to_yaml().unwrap();
        let parsed = SceneConfig::from_yaml(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let text = r#"
max_step: 0.1
rings:
  - name: solo
    count: 12
    placement:
      base_speed: 0.5
"#;
        let config = SceneConfig::from_yaml(text).unwrap();
        assert_eq!(config.max_step, 0.1);
        assert_eq!(config.rings.len(), 1);
        let ring = &config.rings[0];
        assert_eq!(ring.count, 12);
        assert_eq!(ring.placement.base_speed, 0.5);
        assert_eq!(ring.placement.phase_step, PlacementParams::default().phase_step);
        assert_eq!(ring.path, LoopPath::default());
        assert_eq!(config.core, CoreCubeConfig::default());
    }

    #[test]
    fn curve_kind_parses_from_yaml() {
        let text = r#"
rings:
  - name: tight
    count: 3
    curve:
      type: uniform
      tension: 0.3
"#;
        let config = SceneConfig::from_yaml(text).unwrap();
        assert_eq!(config.rings[0].curve, CurveKind::Uniform { tension: 0.3 });
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let config = SceneConfig {
            rings: vec![RingConfig::central(), RingConfig::central()],
            ..SceneConfig::default()
        };
        assert!(matches!(config.validate(), Err(SceneError::InvalidConfig(_))));
    }

    #[test]
    fn bad_max_step_is_rejected() {
        let config = SceneConfig {
            max_step: 0.0,
            ..SceneConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn oversized_ring_is_rejected() {
        let mut config = SceneConfig::default();
        config.rings[0].count = MAX_RING_INSTANCES + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn oversized_path_is_rejected_before_building() {
        let text = "rings: [{name: r, count: 4, path: {samples: 1000000000000000}}]";
        let err = SceneConfig::from_yaml(text).unwrap_err();
        assert!(matches!(err, SceneError::InvalidConfig(_)));

        let mut config = SceneConfig::default();
        config.rings[2].path.samples = MAX_PATH_SAMPLES + 1;
        assert!(matches!(config.validate(), Err(SceneError::InvalidConfig(_))));
    }

    #[test]
    fn non_finite_path_is_rejected() {
        let mut config = SceneConfig::default();
        config.rings[0].path.radius = f32::INFINITY;
        assert!(matches!(config.validate(), Err(SceneError::InvalidConfig(_))));

        let mut config = SceneConfig::default();
        config.rings[1].path.height_offset = f32::NAN;
        assert!(matches!(config.validate(), Err(SceneError::InvalidConfig(_))));
    }

    #[test]
    fn nan_tension_is_rejected() {
        let text = r#"
rings:
  - name: broken
    count: 4
    curve:
      type: uniform
      tension: .nan
"#;
        let err = SceneConfig::from_yaml(text).unwrap_err();
        assert!(matches!(
            err,
            SceneError::Curve { ref ring, source: CurveError::NonFiniteTension { .. } } if ring == "broken"
        ));
    }

    #[test]
    fn save_and_load_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.yaml");
        let mut config = SceneConfig::default();
        config.rings[1].count = 7;
        config.save(&path).unwrap();
        let loaded = SceneConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SceneConfig::load(dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, SceneError::Io(_)));
    }

    #[test]
    fn malformed_yaml_is_yaml_error() {
        let err = SceneConfig::from_yaml("rings: [ {name: 3").unwrap_err();
        assert!(matches!(err, SceneError::Yaml(_)));
    }
}
