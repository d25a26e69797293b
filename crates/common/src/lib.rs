//! Shared value types used by every layer of the scene.
//!
//! Everything here is `Copy` and owns no resources.

mod color;
mod types;

pub use color::{Rgb, SurfaceStyle};
pub use types::InstanceTransform;
