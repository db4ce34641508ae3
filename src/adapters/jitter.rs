//! Jitter adapters: Implementations of JitterSource.
//!
//! # Mutex Behavior
//!
//! `SeededJitter` keeps its RNG behind a `Mutex`. A poisoned mutex yields
//! zero jitter so the fallback estimate is still produced.

use std::sync::Mutex;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::domain::heuristic::JITTER_AMPLITUDE;
use crate::ports::JitterSource;

/// Uniform jitter drawn from a ChaCha20 stream.
pub struct SeededJitter {
    rng: Mutex<ChaCha20Rng>,
}

impl SeededJitter {
    /// Seed from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(ChaCha20Rng::from_entropy()),
        }
    }

    /// Reproducible stream for a given seed.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha20Rng::seed_from_u64(seed)),
        }
    }
}

impl Default for SeededJitter {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl JitterSource for SeededJitter {
    fn sample(&self) -> f64 {
        match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(-JITTER_AMPLITUDE..JITTER_AMPLITUDE),
            Err(_) => {
                tracing::warn!("Jitter RNG unavailable, using zero jitter");
                0.0
            }
        }
    }
}

/// Constant jitter, for deterministic estimates.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedJitter(pub f64);

impl JitterSource for FixedJitter {
    fn sample(&self) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_stay_in_range() {
        let jitter = SeededJitter::from_entropy();
        for _ in 0..1000 {
            let v = jitter.sample();
            assert!((-JITTER_AMPLITUDE..JITTER_AMPLITUDE).contains(&v), "{v}");
        }
    }

    #[test]
    fn test_same_seed_same_stream() {
        let a = SeededJitter::from_seed(7);
        let b = SeededJitter::from_seed(7);
        let xs: Vec<f64> = (0..5).map(|_| a.sample()).collect();
        let ys: Vec<f64> = (0..5).map(|_| b.sample()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_fixed_jitter() {
        assert_eq!(FixedJitter(2.5).sample(), 2.5);
        assert_eq!(FixedJitter::default().sample(), 0.0);
    }
}
