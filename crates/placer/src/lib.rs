//! Instance Placer: where every cube of a ring sits on a given frame.
//!
//! # Invariants
//! - Placement is a pure function of `(curve, params, index, time)`.
//! - Colors are fixed when a placer is created and never recomputed.
//! - `InstancePlacer::place` is O(N) and never reallocates.

mod params;
mod placer;

pub use params::{HueWave, PlacementError, PlacementParams};
pub use placer::{InstancePlacer, InstanceState, align_forward, instance_transform, place, place_into};
