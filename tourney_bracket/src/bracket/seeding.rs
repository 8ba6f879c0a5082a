//! Seed order randomization for first-round match assignment.

use rand::Rng;
use rand::rngs::ThreadRng;

/// Randomizes the order in which participants are placed into the first round.
///
/// The order decides initial pairings only; it is not a skill ranking.
pub struct SeedRandomizer<R = ThreadRng> {
    rng: R,
}

impl SeedRandomizer {
    /// Create a randomizer backed by the thread-local generator
    pub fn new() -> Self {
        Self { rng: rand::rng() }
    }
}

impl Default for SeedRandomizer {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> SeedRandomizer<R> {
    /// Create a randomizer over a caller-supplied generator (e.g. a seeded `StdRng`)
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Fisher-Yates shuffle in place.
    ///
    /// Walks from the last index down to 1 and swaps each element with a
    /// uniformly chosen index in `[0, i]`.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.rng.random_range(0..=i);
            items.swap(i, j);
        }
    }
}
