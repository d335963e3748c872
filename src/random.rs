use rand::{Rng, SeedableRng, rngs::StdRng};

/// Source of randomness consumed by sampling and clustering
///
/// Seeded runs are reproducible only if every consumer draws from the same
/// source in the same order.
pub trait RandomSource {
    /// Uniform integer in `min..max` (max exclusive)
    fn randint(&mut self, min: usize, max: usize) -> usize;

    /// Uniform real in `min..=max`
    fn uniform(&mut self, min: f64, max: f64) -> f64;
}

/// Random source backed by `StdRng`
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    /// Create a reproducible source from an explicit seed
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create a source seeded from the operating system
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Seeded when a seed is given, entropy otherwise
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::from_entropy(),
        }
    }
}

impl RandomSource for SeededRandom {
    fn randint(&mut self, min: usize, max: usize) -> usize {
        self.rng.random_range(min..max)
    }

    fn uniform(&mut self, min: f64, max: f64) -> f64 {
        // Degenerate ranges happen when every point shares a coordinate
        if min >= max {
            return min;
        }
        self.rng.random_range(min..=max)
    }
}
