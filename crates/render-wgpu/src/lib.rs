//! wgpu render backend for the electric cube scene.
//!
//! Draws the ring cubes, the core cube and the starfield into an HDR target,
//! then runs bloom and tone mapping into the swapchain surface. The camera
//! follows an automatic fly-around until the user drags it.
//!
//! # Invariants
//! - Renderer never mutates scene state.
//! - Camera motion is NOT part of the scene kernel.
//! - Instance buffers are rewritten every frame from the scene's current states.

mod bloom;
mod camera;
mod gpu;
mod shaders;

pub use bloom::BloomPass;
pub use camera::{MAX_DISTANCE, MIN_DISTANCE, OrbitCamera};
pub use gpu::{HDR_FORMAT, WgpuRenderer};
