//! Developer Tooling: scene inspector and frame timing.
//!
//! # Invariants
//! - Tools only read the scene.

mod inspector;
mod timing;

pub use inspector::{InstanceInfo, RingSummary, SceneInspector, SceneSummary};
pub use timing::FrameTimer;
