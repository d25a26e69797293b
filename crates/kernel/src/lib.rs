//! Scene Kernel: frame clock, ring ownership and the per-frame tick.
//!
//! # Invariants
//! - Simulation time only moves forward, by at most `max_step` per frame.
//! - One tick runs `advance`, then every ring's `place` in config order, then the core cube.
//! - Nothing here touches the GPU; renderers read the scene, never mutate it.

pub mod clock;
pub mod config;
pub mod ring;
pub mod scene;

pub use clock::{ClockError, DEFAULT_MAX_STEP, FrameClock};
pub use config::{CoreCubeConfig, RingConfig, SceneConfig};
pub use ring::Ring;
pub use scene::{ElectricScene, SceneError};
