//! Rendering Adapter: everything a renderer needs besides the GPU.
//!
//! # Invariants
//! - Renderers read the scene; they never mutate it.
//! - Camera motion and the starfield live outside the kernel and do not
//!   affect instance placement.

mod orbit;
mod post;
mod renderer;
mod starfield;

pub use orbit::OrbitPath;
pub use post::BloomSettings;
pub use renderer::{DebugTextRenderer, RenderView, Renderer};
pub use starfield::{SplitMix64, Star, StarfieldConfig, generate_starfield};

pub fn crate_info() -> &'static str {
    "electric-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
