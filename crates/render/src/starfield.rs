use electric_common::Rgb;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, TAU};

/// Deterministic generator used for the starfield.
///
/// Same seed, same stars, on every platform.
#[derive(Debug, Clone)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        // Top 24 bits fill the f32 mantissa exactly.
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Uniform in `[lo, hi)`.
    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + self.next_f32() * (hi - lo)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarfieldConfig {
    pub count: usize,
    pub min_radius: f32,
    pub max_radius: f32,
    pub seed: u64,
}

impl Default for StarfieldConfig {
    fn default() -> Self {
        Self {
            count: 15_000,
            min_radius: 400.0,
            max_radius: 1600.0,
            seed: 0x5eed_57a2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    pub position: Vec3,
    pub color: Rgb,
}

const BLUE_WHITE: Rgb = Rgb::new(0.8, 0.9, 1.0);
const YELLOW_WHITE: Rgb = Rgb::new(1.0, 0.95, 0.8);

/// Scatter stars in a spherical shell around the origin.
///
/// 70% white, 20% blue-white, 10% yellow-white.
pub fn generate_starfield(config: &StarfieldConfig) -> Vec<Star> {
    let mut rng = SplitMix64::new(config.seed);
    let (lo, hi) = if config.max_radius >= config.min_radius {
        (config.min_radius, config.max_radius)
    } else {
        (config.max_radius, config.min_radius)
    };

    let stars: Vec<Star> = (0..config.count)
        .map(|_| {
            let radius = rng.range(lo, hi);
            let theta = rng.range(0.0, TAU);
            let phi = rng.range(-FRAC_PI_2, FRAC_PI_2);
            let position = Vec3::new(
                radius * phi.cos() * theta.cos(),
                radius * phi.sin(),
                radius * phi.cos() * theta.sin(),
            );

            let pick = rng.next_f32();
            let color = if pick < 0.7 {
                Rgb::WHITE
            } else if pick < 0.9 {
                BLUE_WHITE
            } else {
                YELLOW_WHITE
            };

            Star { position, color }
        })
        .collect();

    tracing::debug!(count = stars.len(), seed = config.seed, "generated starfield");
    stars
}
