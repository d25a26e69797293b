//! Curve Builder: closed smooth loops through a set of control points.
//!
//! # Invariants
//! - A curve has at least 3 control points and is immutable once built.
//! - `position_at` / `tangent_at` are pure functions of `t`, periodic with period 1.
//! - The parameter is NOT arc-length normalized: equal steps in `t` cover one
//!   segment each, whatever the segment's length.

mod path;
mod sampler;

pub use path::LoopPath;
pub use sampler::{CurveError, CurveKind, CurveSampler, MIN_CONTROL_POINTS, wrap_unit};
