//! White noise from a seeded generator, so every render is reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform white noise in [-1, 1).
#[derive(Debug, Clone)]
pub struct WhiteNoise {
    rng: StdRng,
}

impl WhiteNoise {
    pub fn new(seed: u64) -> Self {
        WhiteNoise {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn next_sample(&mut self) -> f32 {
        self.rng.gen_range(-1.0..1.0)
    }

    /// Fill `out` with fresh noise.
    pub fn fill(&mut self, out: &mut [f32]) {
        for s in out.iter_mut() {
            *s = self.next_sample();
        }
    }
}
