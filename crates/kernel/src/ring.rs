use electric_common::SurfaceStyle;
use electric_placer::{InstancePlacer, InstanceState};

use crate::config::RingConfig;
use crate::scene::SceneError;

/// A named group of instances on one privately owned curve.
#[derive(Debug, Clone)]
pub struct Ring {
    name: String,
    placer: InstancePlacer,
    style: SurfaceStyle,
}

impl Ring {
    /// Build the ring's curve and create its instances.
    pub fn from_config(config: &RingConfig) -> Result<Self, SceneError> {
        let sampler = config
            .path
            .build(config.curve)
            .map_err(|source| SceneError::Curve {
                ring: config.name.clone(),
                source,
            })?;
        let placer = InstancePlacer::new(sampler, config.count, config.placement).map_err(
            |source| SceneError::Placement {
                ring: config.name.clone(),
                source,
            },
        )?;

        tracing::debug!(
            ring = %config.name,
            instances = config.count,
            control_points = config.path.samples,
            "ring built"
        );

        Ok(Self {
            name: config.name.clone(),
            placer,
            style: config.style,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn style(&self) -> &SurfaceStyle {
        &self.style
    }

    pub fn len(&self) -> usize {
        self.placer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placer.is_empty()
    }

    /// Instances as of the last tick.
    pub fn states(&self) -> &[InstanceState] {
        self.placer.states()
    }

    pub fn placer(&self) -> &InstancePlacer {
        &self.placer
    }

    pub(crate) fn place(&mut self, time: f64) {
        self.placer.place(time);
    }
}
