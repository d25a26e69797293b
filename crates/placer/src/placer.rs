use electric_common::{InstanceTransform, Rgb};
use electric_curve::{CurveSampler, wrap_unit};
use glam::{Mat3, Quat, Vec3};
use std::f64::consts::TAU;

use crate::params::{PlacementError, PlacementParams};

/// One instance on one frame: where it is, and the color it was born with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceState {
    pub transform: InstanceTransform,
    pub color: Rgb,
}

/// Rotation that maps local +Y (the cube's forward axis) onto `forward`.
///
/// Built like a look-at: local +Z follows the direction of travel, the
/// basis is completed against world up, then a quarter turn about X moves
/// the forward role onto +Y. Falls back to world Z as the reference when
/// travelling straight up or down.
pub fn align_forward(forward: Vec3) -> Quat {
    let z = forward.try_normalize().unwrap_or(Vec3::Z);
    let x = Vec3::Y
        .cross(z)
        .try_normalize()
        .unwrap_or_else(|| Vec3::Z.cross(z).normalize());
    let y = z.cross(x);
    let look = Quat::from_mat3(&Mat3::from_cols(x, y, z));
    (look * Quat::from_rotation_x(std::f32::consts::FRAC_PI_2)).normalize()
}

/// `time * rate`, reduced modulo `period` before it can overflow.
///
/// Stays finite for any finite `time`; the result lies in `(-period, period)`.
fn cycle(time: f64, rate: f64, period: f64) -> f64 {
    if rate == 0.0 {
        return 0.0;
    }
    let span = period / rate.abs();
    if !span.is_finite() {
        // Rate so small that `time * rate` cannot overflow.
        return (time * rate) % period;
    }
    time.rem_euclid(span) * rate
}

/// Transform of instance `index` at simulation time `time`.
///
/// Pure: no state is read besides the arguments. Valid for any finite
/// `time`, including negative pre-roll and very long sessions.
pub fn instance_transform(
    sampler: &CurveSampler,
    params: &PlacementParams,
    index: usize,
    time: f64,
) -> InstanceTransform {
    let i = index as f64;
    let t = wrap_unit(cycle(time, params.speed_of(index), 1.0) + i * params.phase_step);
    let (position, tangent) = sampler.frame_at(t);

    // Wrap in f64 so long sessions do not lose precision in the f32 angle.
    let spin = (cycle(time, params.spin_rate, TAU) + i * params.spin_phase_step).rem_euclid(TAU);
    let rotation = align_forward(tangent) * Quat::from_rotation_y(spin as f32);

    let pulse = (cycle(time, params.scale_pulse_frequency, TAU) + i * params.scale_phase_step).sin();
    let scale = (params.scale_base + pulse * params.scale_amplitude) as f32;

    InstanceTransform {
        position,
        rotation,
        scale,
    }
}

/// Create `count` instances at `time`, colors included.
///
/// This is instance creation: `params.colors` runs once per index and a new
/// buffer is allocated. Per-frame updates go through [`place_into`] (or an
/// [`InstancePlacer`]), which leaves colors untouched.
pub fn place(
    sampler: &CurveSampler,
    count: usize,
    time: f64,
    params: &PlacementParams,
) -> Vec<InstanceState> {
    let mut states: Vec<InstanceState> = (0..count)
        .map(|index| InstanceState {
            transform: InstanceTransform::default(),
            color: params.colors.color(index),
        })
        .collect();
    place_into(sampler, time, params, &mut states);
    states
}

/// Rewrite the transform of every state in place; colors are not touched.
pub fn place_into(
    sampler: &CurveSampler,
    time: f64,
    params: &PlacementParams,
    states: &mut [InstanceState],
) {
    for (index, state) in states.iter_mut().enumerate() {
        state.transform = instance_transform(sampler, params, index, time);
    }
}

/// A ring of `count` instances travelling along one privately owned curve.
///
/// Owns its output buffer: every call to [`InstancePlacer::place`] rewrites
/// the same `count` slots.
#[derive(Debug, Clone)]
pub struct InstancePlacer {
    sampler: CurveSampler,
    params: PlacementParams,
    states: Vec<InstanceState>,
}

impl InstancePlacer {
    /// Create `count` instances colored by `params.colors`.
    pub fn new(
        sampler: CurveSampler,
        count: usize,
        params: PlacementParams,
    ) -> Result<Self, PlacementError> {
        let colors = params.colors;
        Self::with_color_fn(sampler, count, params, |i| colors.color(i))
    }

    /// Create `count` instances with colors from `color_fn`, called once per index.
    pub fn with_color_fn(
        sampler: CurveSampler,
        count: usize,
        params: PlacementParams,
        color_fn: impl Fn(usize) -> Rgb,
    ) -> Result<Self, PlacementError> {
        params.validate()?;
        let states = (0..count)
            .map(|index| InstanceState {
                transform: InstanceTransform::default(),
                color: color_fn(index),
            })
            .collect();
        let mut placer = Self {
            sampler,
            params,
            states,
        };
        placer.place(0.0);
        Ok(placer)
    }

    /// Recompute every transform for `time` and return the full buffer.
    pub fn place(&mut self, time: f64) -> &[InstanceState] {
        let _span = tracing::trace_span!("place", instances = self.states.len()).entered();
        place_into(&self.sampler, time, &self.params, &mut self.states);
        &self.states
    }

    /// Result of the most recent `place`.
    pub fn states(&self) -> &[InstanceState] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn sampler(&self) -> &CurveSampler {
        &self.sampler
    }

    pub fn params(&self) -> &PlacementParams {
        &self.params
    }

    /// Swap motion parameters; colors are kept as they were created.
    pub fn set_params(&mut self, params: PlacementParams) -> Result<(), PlacementError> {
        params.validate()?;
        self.params = params;
        Ok(())
    }
}
