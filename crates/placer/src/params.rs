use electric_common::Rgb;
use serde::{Deserialize, Serialize};

/// Errors from placement configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlacementError {
    #[error("placement parameter `{name}` must be finite, got {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

/// Per-instance color: a hue that wobbles sinusoidally with the instance index.
///
/// `color(i) = hsl(base_hue + sin(i · frequency) · amplitude, saturation, lightness)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HueWave {
    pub base_hue: f32,
    pub amplitude: f32,
    pub frequency: f32,
    pub saturation: f32,
    pub lightness: f32,
}

impl Default for HueWave {
    fn default() -> Self {
        Self {
            base_hue: 0.55,
            amplitude: 0.1,
            frequency: 0.1,
            saturation: 0.9,
            lightness: 0.7,
        }
    }
}

impl HueWave {
    pub fn color(&self, index: usize) -> Rgb {
        let hue = self.base_hue + (index as f32 * self.frequency).sin() * self.amplitude;
        Rgb::from_hsl(hue, self.saturation, self.lightness)
    }
}

/// How one ring's instances move, pulse and spin.
///
/// For instance `i` at time `τ`:
/// - speed `v_i = base_speed + speed_variance · sin(i · speed_variation_frequency)`
/// - curve parameter `t_i = frac(τ · v_i + i · phase_step)`
/// - scale `scale_base + sin(τ · scale_pulse_frequency + i · scale_phase_step) · scale_amplitude`
/// - spin about the direction of travel `spin_rate · τ + i · spin_phase_step`
///
/// Defaults reproduce the central (blue) ring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementParams {
    pub base_speed: f64,
    pub speed_variance: f64,
    pub speed_variation_frequency: f64,
    pub phase_step: f64,
    pub scale_base: f64,
    pub scale_amplitude: f64,
    pub scale_pulse_frequency: f64,
    pub scale_phase_step: f64,
    pub spin_rate: f64,
    pub spin_phase_step: f64,
    pub colors: HueWave,
}

impl Default for PlacementParams {
    fn default() -> Self {
        Self {
            base_speed: 0.2,
            speed_variance: 0.1,
            speed_variation_frequency: 0.05,
            phase_step: 0.01,
            scale_base: 0.6,
            scale_amplitude: 0.3,
            scale_pulse_frequency: 3.0,
            scale_phase_step: 0.5,
            spin_rate: 0.8,
            spin_phase_step: 0.2,
            colors: HueWave::default(),
        }
    }
}

impl PlacementParams {
    /// Everything at rest: no travel, no pulse, no spin, unit scale.
    pub fn stationary() -> Self {
        Self {
            base_speed: 0.0,
            speed_variance: 0.0,
            phase_step: 0.0,
            scale_base: 1.0,
            scale_amplitude: 0.0,
            spin_rate: 0.0,
            spin_phase_step: 0.0,
            ..Self::default()
        }
    }

    /// Reject NaN or infinite values before they reach the per-frame path.
    pub fn validate(&self) -> Result<(), PlacementError> {
        let fields = [
            ("base_speed", self.base_speed),
            ("speed_variance", self.speed_variance),
            ("speed_variation_frequency", self.speed_variation_frequency),
            ("phase_step", self.phase_step),
            ("scale_base", self.scale_base),
            ("scale_amplitude", self.scale_amplitude),
            ("scale_pulse_frequency", self.scale_pulse_frequency),
            ("scale_phase_step", self.scale_phase_step),
            ("spin_rate", self.spin_rate),
            ("spin_phase_step", self.spin_phase_step),
            ("colors.base_hue", self.colors.base_hue as f64),
            ("colors.amplitude", self.colors.amplitude as f64),
            ("colors.frequency", self.colors.frequency as f64),
            ("colors.saturation", self.colors.saturation as f64),
            ("colors.lightness", self.colors.lightness as f64),
        ];
        match fields.into_iter().find(|(_, value)| !value.is_finite()) {
            Some((name, value)) => Err(PlacementError::InvalidParameter { name, value }),
            None => Ok(()),
        }
    }

    /// Effective travel speed of instance `index`, in loops per second.
    pub fn speed_of(&self, index: usize) -> f64 {
        self.base_speed
            + self.speed_variance * (index as f64 * self.speed_variation_frequency).sin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PlacementParams::default().validate().is_ok());
        assert!(PlacementParams::stationary().validate().is_ok());
    }

    #[test]
    fn nan_is_rejected_with_field_name() {
        let params = PlacementParams {
            spin_rate: f64::NAN,
            ..PlacementParams::default()
        };
        match params.validate() {
            Err(PlacementError::InvalidParameter { name, .. }) => assert_eq!(name, "spin_rate"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn infinite_color_is_rejected() {
        let mut params = PlacementParams::default();
        params.colors.lightness = f32::INFINITY;
        assert!(params.validate().is_err());
    }

    #[test]
    fn speed_variance_is_bounded_and_smooth() {
        let params = PlacementParams::default();
        for i in 0..100 {
            let v = params.speed_of(i);
            assert!((0.1..=0.3).contains(&v));
            let next = params.speed_of(i + 1);
            assert!((next - v).abs() <= 0.1 * 0.05 + 1e-12);
        }
        assert_ne!(params.speed_of(10), params.speed_of(11));
    }

    #[test]
    fn hue_wave_is_deterministic() {
        let wave = HueWave::default();
        assert_eq!(wave.color(7), wave.color(7));
        assert_eq!(wave.color(0), Rgb::from_hsl(0.55, 0.9, 0.7));
    }
}
