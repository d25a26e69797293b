use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Smallest number of control points that closes into a loop.
pub const MIN_CONTROL_POINTS: usize = 3;

/// Squared knot distance below which a non-uniform segment is treated as degenerate.
const DEGENERATE_KNOT: f32 = 1e-4;

/// Errors from curve construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CurveError {
    #[error("a closed curve needs at least 3 control points, got {got}")]
    TooFewPoints { got: usize },
    #[error("control point {index} is not finite")]
    NonFinitePoint { index: usize },
    #[error("curve tension must be finite, got {tension}")]
    NonFiniteTension { tension: f32 },
}

/// Catmull-Rom flavour used to derive segment tangents.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CurveKind {
    /// Knot spacing = distance^0.5. Avoids cusps and self-intersections.
    #[default]
    Centripetal,
    /// Knot spacing = distance.
    Chordal,
    /// Evenly spaced knots with the given tension (0.5 is classic Catmull-Rom).
    Uniform { tension: f32 },
}

impl CurveKind {
    /// Exponent applied to the squared distance between knots, if non-uniform.
    fn knot_exponent(self) -> Option<f32> {
        match self {
            Self::Centripetal => Some(0.25),
            Self::Chordal => Some(0.5),
            Self::Uniform { .. } => None,
        }
    }

    /// Reject parameters that would turn every sample into NaN.
    pub fn validate(self) -> Result<(), CurveError> {
        match self {
            Self::Uniform { tension } if !tension.is_finite() => {
                Err(CurveError::NonFiniteTension { tension })
            }
            _ => Ok(()),
        }
    }
}

/// One cubic piece `c0 + c1 u + c2 u^2 + c3 u^3`, `u` in `[0, 1]`.
#[derive(Debug, Clone, Copy)]
struct Segment {
    c0: Vec3,
    c1: Vec3,
    c2: Vec3,
    c3: Vec3,
}

impl Segment {
    /// Cubic Hermite between `p1` and `p2` with end tangents `t1`, `t2`.
    fn hermite(p1: Vec3, p2: Vec3, t1: Vec3, t2: Vec3) -> Self {
        Self {
            c0: p1,
            c1: t1,
            c2: -3.0 * p1 + 3.0 * p2 - 2.0 * t1 - t2,
            c3: 2.0 * p1 - 2.0 * p2 + t1 + t2,
        }
    }

    fn uniform(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, tension: f32) -> Self {
        Self::hermite(p1, p2, (p2 - p0) * tension, (p3 - p1) * tension)
    }

    fn non_uniform(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, exponent: f32) -> Self {
        let mut dt1 = p1.distance_squared(p2).powf(exponent);
        let mut dt0 = p0.distance_squared(p1).powf(exponent);
        let mut dt2 = p2.distance_squared(p3).powf(exponent);
        if dt1 < DEGENERATE_KNOT {
            dt1 = 1.0;
        }
        if dt0 < DEGENERATE_KNOT {
            dt0 = dt1;
        }
        if dt2 < DEGENERATE_KNOT {
            dt2 = dt1;
        }

        let t1 = (p1 - p0) / dt0 - (p2 - p0) / (dt0 + dt1) + (p2 - p1) / dt1;
        let t2 = (p2 - p1) / dt1 - (p3 - p1) / (dt1 + dt2) + (p3 - p2) / dt2;
        Self::hermite(p1, p2, t1 * dt1, t2 * dt1)
    }

    #[inline]
    fn point(&self, u: f32) -> Vec3 {
        self.c0 + (self.c1 + (self.c2 + self.c3 * u) * u) * u
    }

    #[inline]
    fn derivative(&self, u: f32) -> Vec3 {
        self.c1 + (2.0 * self.c2 + 3.0 * self.c3 * u) * u
    }
}

/// Wrap any real parameter into `[0, 1)` via `t - floor(t)`.
///
/// Rounding can push tiny negative inputs up to exactly 1.0; those fold back to 0.
pub fn wrap_unit(t: f64) -> f64 {
    let w = t - t.floor();
    if w >= 1.0 { 0.0 } else { w }
}

/// Read-only sampler over a closed curve.
///
/// The control points are interpolated: `position_at(i / n)` is exactly
/// control point `i`. Segment coefficients are precomputed at build time, so
/// sampling is branch-light and allocation-free. The sampler is `Send + Sync`
/// and may be shared by any number of readers.
#[derive(Debug, Clone)]
pub struct CurveSampler {
    points: Vec<Vec3>,
    segments: Vec<Segment>,
}

impl CurveSampler {
    /// Build a centripetal Catmull-Rom loop through `points`.
    pub fn build(points: &[Vec3]) -> Result<Self, CurveError> {
        Self::build_with(points, CurveKind::default())
    }

    /// Build a closed loop through `points` using the given spline flavour.
    /// The last point connects back to the first.
    pub fn build_with(points: &[Vec3], kind: CurveKind) -> Result<Self, CurveError> {
        if points.len() < MIN_CONTROL_POINTS {
            return Err(CurveError::TooFewPoints { got: points.len() });
        }
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(CurveError::NonFinitePoint { index });
        }
        kind.validate()?;

        let n = points.len();
        let segments = (0..n)
            .map(|i| {
                let p0 = points[(i + n - 1) % n];
                let p1 = points[i];
                let p2 = points[(i + 1) % n];
                let p3 = points[(i + 2) % n];
                match kind.knot_exponent() {
                    Some(exponent) => Segment::non_uniform(p0, p1, p2, p3, exponent),
                    None => {
                        let tension = match kind {
                            CurveKind::Uniform { tension } => tension,
                            _ => 0.5,
                        };
                        Segment::uniform(p0, p1, p2, p3, tension)
                    }
                }
            })
            .collect();

        tracing::debug!(points = n, ?kind, "closed curve built");

        Ok(Self {
            points: points.to_vec(),
            segments,
        })
    }

    /// Control points the curve passes through.
    pub fn control_points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Map `t` to a segment index and the local parameter inside it.
    fn locate(&self, t: f64) -> (usize, f32) {
        let n = self.segments.len();
        let scaled = wrap_unit(t) * n as f64;
        // NaN casts to 0, which keeps the lookup in bounds.
        let index = (scaled.floor() as usize).min(n - 1);
        (index, (scaled - index as f64) as f32)
    }

    /// Point on the loop at parameter `t`; any real `t` is accepted.
    pub fn position_at(&self, t: f64) -> Vec3 {
        let (index, u) = self.locate(t);
        self.segments[index].point(u)
    }

    /// Unit direction of travel at `t`.
    ///
    /// This is the normalized derivative of the interpolation. It carries no
    /// speed information. Degenerate segments fall back to their chord.
    pub fn tangent_at(&self, t: f64) -> Vec3 {
        let (index, u) = self.locate(t);
        self.tangent_in(index, u)
    }

    /// Position and tangent together, sharing the segment lookup.
    pub fn frame_at(&self, t: f64) -> (Vec3, Vec3) {
        let (index, u) = self.locate(t);
        (self.segments[index].point(u), self.tangent_in(index, u))
    }

    fn tangent_in(&self, index: usize, u: f32) -> Vec3 {
        let n = self.points.len();
        let chord = self.points[(index + 1) % n] - self.points[index];
        self.segments[index]
            .derivative(u)
            .try_normalize()
            .or_else(|| chord.try_normalize())
            .unwrap_or(Vec3::X)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    fn hexagon(radius: f32) -> Vec<Vec3> {
        (0..6)
            .map(|i| {
                let a = i as f32 / 6.0 * TAU;
                Vec3::new(a.cos() * radius, 0.0, a.sin() * radius)
            })
            .collect()
    }

    fn all_kinds() -> [CurveKind; 3] {
        [
            CurveKind::Centripetal,
            CurveKind::Chordal,
            CurveKind::Uniform { tension: 0.5 },
        ]
    }

    #[test]
    fn two_points_are_rejected() {
        let err = CurveSampler::build(&[Vec3::ZERO, Vec3::X]).unwrap_err();
        assert_eq!(err, CurveError::TooFewPoints { got: 2 });
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            CurveSampler::build(&[]),
            Err(CurveError::TooFewPoints { got: 0 })
        ));
    }

    #[test]
    fn triangle_is_accepted() {
        let curve = CurveSampler::build(&[Vec3::ZERO, Vec3::X, Vec3::Z]).unwrap();
        assert_eq!(curve.segment_count(), 3);
    }

    #[test]
    fn non_finite_point_is_rejected() {
        let err = CurveSampler::build(&[Vec3::ZERO, Vec3::new(f32::NAN, 0.0, 0.0), Vec3::Z])
            .unwrap_err();
        assert_eq!(err, CurveError::NonFinitePoint { index: 1 });
    }

    #[test]
    fn non_finite_tension_is_rejected() {
        for tension in [f32::NAN, f32::INFINITY] {
            let err = CurveSampler::build_with(&hexagon(1.0), CurveKind::Uniform { tension })
                .unwrap_err();
            assert!(matches!(err, CurveError::NonFiniteTension { .. }));
        }
        assert!(CurveKind::Uniform { tension: 0.0 }.validate().is_ok());
    }

    #[test]
    fn frame_matches_separate_lookups() {
        let curve = CurveSampler::build(&hexagon(120.0)).unwrap();
        for k in 0..30 {
            let t = k as f64 * 0.071 - 0.5;
            assert_eq!(curve.frame_at(t), (curve.position_at(t), curve.tangent_at(t)));
        }
    }

    #[test]
    fn passes_through_control_points() {
        let points = hexagon(120.0);
        for kind in all_kinds() {
            let curve = CurveSampler::build_with(&points, kind).unwrap();
            for (i, p) in points.iter().enumerate() {
                let q = curve.position_at(i as f64 / 6.0);
                assert!((q - *p).length() < 1e-3, "{kind:?} vertex {i}: {q} vs {p}");
            }
        }
    }

    #[test]
    fn position_is_periodic() {
        let curve = CurveSampler::build(&hexagon(120.0)).unwrap();
        for k in 0..50 {
            let t = -3.0 + k as f64 * 0.137;
            let p = curve.position_at(t);
            assert!((p - curve.position_at(t + 1.0)).length() < 1e-3);
            assert!((p - curve.position_at(t - 1.0)).length() < 1e-3);
        }
    }

    #[test]
    fn wrap_unit_handles_negative_and_large() {
        assert_eq!(wrap_unit(0.25), 0.25);
        assert!((wrap_unit(-0.25) - 0.75).abs() < 1e-12);
        assert!((wrap_unit(7.5) - 0.5).abs() < 1e-12);
        assert_eq!(wrap_unit(-1e-20), 0.0);
        assert_eq!(wrap_unit(3.0), 0.0);
    }

    #[test]
    fn loop_is_continuous_across_seam() {
        let curve = CurveSampler::build(&hexagon(120.0)).unwrap();
        let before = curve.position_at(1.0 - 1e-7);
        let after = curve.position_at(0.0);
        assert!((before - after).length() < 1e-2);
    }

    #[test]
    fn tangent_is_unit_length() {
        for kind in all_kinds() {
            let curve = CurveSampler::build_with(&hexagon(120.0), kind).unwrap();
            for k in 0..100 {
                let tangent = curve.tangent_at(k as f64 / 100.0);
                assert!((tangent.length() - 1.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn tangent_follows_direction_of_travel() {
        let curve = CurveSampler::build(&hexagon(120.0)).unwrap();
        for k in 0..60 {
            let t = k as f64 / 60.0;
            let ahead = curve.position_at(t + 1e-4) - curve.position_at(t);
            assert!(curve.tangent_at(t).dot(ahead.normalize()) > 0.99);
        }
    }

    #[test]
    fn parameter_is_not_arc_length() {
        // One long edge and two short ones: each still takes a third of `t`.
        let points = [
            Vec3::ZERO,
            Vec3::new(100.0, 0.0, 0.0),
            Vec3::new(100.0, 0.0, 10.0),
        ];
        let curve = CurveSampler::build_with(&points, CurveKind::Uniform { tension: 0.5 }).unwrap();
        let long = (curve.position_at(1.0 / 3.0) - curve.position_at(0.0)).length();
        let short = (curve.position_at(2.0 / 3.0) - curve.position_at(1.0 / 3.0)).length();
        assert!(long > 5.0 * short);
    }

    #[test]
    fn duplicate_points_stay_finite() {
        let points = [Vec3::ZERO, Vec3::ZERO, Vec3::X, Vec3::Z];
        for kind in all_kinds() {
            let curve = CurveSampler::build_with(&points, kind).unwrap();
            for k in 0..40 {
                let (p, tangent) = curve.frame_at(k as f64 / 40.0);
                assert!(p.is_finite());
                assert!(tangent.is_finite());
            }
        }
    }

    #[test]
    fn nan_parameter_does_not_panic() {
        let curve = CurveSampler::build(&hexagon(1.0)).unwrap();
        let _ = curve.position_at(f64::NAN);
        let _ = curve.tangent_at(f64::INFINITY);
    }
}
