//! Injectable randomness.
//!
//! Everything random in the responder (idle chatter, template picks, jokes,
//! typing delays) draws from a [`RandomSource`] so tests and the CLI can pin
//! the outcome.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// A source of uniform draws.
pub trait RandomSource: Send + Sync {
    /// Uniform draw over `[0, 1)`.
    fn unit(&self) -> f64;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn index(&self, len: usize) -> usize {
        let i = (self.unit() * len as f64) as usize;
        i.min(len.saturating_sub(1))
    }
}

/// Thread-local OS-seeded RNG. The production default.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn unit(&self) -> f64 {
        rand::rng().random::<f64>()
    }

    fn index(&self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

/// Reproducible stream from a fixed seed.
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn unit(&self) -> f64 {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.random::<f64>()
    }
}

/// Always returns the same draw. `FixedRandom(0.0)` picks the first template
/// and always triggers idle chatter; `FixedRandom(0.99)` never does.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub f64);

impl RandomSource for FixedRandom {
    fn unit(&self) -> f64 {
        self.0.clamp(0.0, 0.999_999_999)
    }
}
