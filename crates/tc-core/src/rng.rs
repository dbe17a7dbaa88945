//! Deterministic simulation-level RNG.
//!
//! The control loop draws random numbers in exactly three places: the random
//! starting offset of a shuffled reset, the permutation of vehicles over
//! starting slots, and the per-episode color choice.  All three go through a
//! single `SimRng` seeded from `EnvParams::seed`, so a run is reproducible
//! from its seed.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Seeded `SmallRng` wrapper used by the single control-loop thread.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Uniform float in `[low, high)`.  Returns `low` for an empty range.
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        self.0.gen_range(low..high)
    }

    /// Shuffle a mutable slice in-place (Fisher-Yates).
    #[inline]
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.0);
    }

    /// Uniform index in `0..len`.  Returns 0 when `len == 0`.
    pub fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.0.gen_range(0..len)
    }
}
