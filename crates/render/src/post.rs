use serde::{Deserialize, Serialize};

/// Bloom post-processing parameters.
///
/// `threshold` is a luminance cutoff for the bright pass; `radius` scales the
/// blur kernel spread; `intensity` weights the blurred glow when composited.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomSettings {
    pub enabled: bool,
    pub intensity: f32,
    pub radius: f32,
    pub threshold: f32,
    pub exposure: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            intensity: 1.8,
            radius: 0.9,
            threshold: 0.4,
            exposure: 1.0,
        }
    }
}

impl BloomSettings {
    pub const INTENSITY_RANGE: std::ops::RangeInclusive<f32> = 0.0..=5.0;
    pub const RADIUS_RANGE: std::ops::RangeInclusive<f32> = 0.0..=2.0;
    pub const THRESHOLD_RANGE: std::ops::RangeInclusive<f32> = 0.0..=2.0;

    /// Clamp every field into its slider range. Non-finite values fall back to
    /// the default.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        let clamp = |v: f32, range: &std::ops::RangeInclusive<f32>, fallback: f32| {
            if v.is_finite() {
                v.clamp(*range.start(), *range.end())
            } else {
                fallback
            }
        };
        Self {
            enabled: self.enabled,
            intensity: clamp(self.intensity, &Self::INTENSITY_RANGE, d.intensity),
            radius: clamp(self.radius, &Self::RADIUS_RANGE, d.radius),
            threshold: clamp(self.threshold, &Self::THRESHOLD_RANGE, d.threshold),
            exposure: if self.exposure.is_finite() && self.exposure > 0.0 {
                self.exposure
            } else {
                d.exposure
            },
        }
    }

    /// Composite weight actually applied; zero when disabled.
    pub fn effective_intensity(&self) -> f32 {
        if self.enabled { self.intensity } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let b = BloomSettings::default();
        assert_eq!(b.intensity, 1.8);
        assert_eq!(b.radius, 0.9);
        assert_eq!(b.threshold, 0.4);
        assert!(b.enabled);
    }

    #[test]
    fn sanitize_clamps_and_replaces_nan() {
        let b = BloomSettings {
            intensity: 99.0,
            radius: f32::NAN,
            threshold: -1.0,
            exposure: 0.0,
            enabled: true,
        }
        .sanitized();
        assert_eq!(b.intensity, 5.0);
        assert_eq!(b.radius, 0.9);
        assert_eq!(b.threshold, 0.0);
        assert_eq!(b.exposure, 1.0);
    }

    #[test]
    fn disabled_bloom_contributes_nothing() {
        let b = BloomSettings {
            enabled: false,
            ..Default::default()
        };
        assert_eq!(b.effective_intensity(), 0.0);
    }
}
