use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of unbiased integers used for role assignment and shuffling.
///
/// Production games must use [`CryptoRandom`]: a predictable source would let a
/// client reconstruct roles or deck order.
pub trait RandomSource: Send {
    /// Returns a uniformly distributed integer in `low..high`.
    ///
    /// Returns `low` when the range is empty.
    fn int_in_range(&mut self, low: usize, high: usize) -> usize;
}

// OS-seeded ChaCha generator.
pub struct CryptoRandom {
    rng: StdRng,
}

impl CryptoRandom {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl Default for CryptoRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for CryptoRandom {
    fn int_in_range(&mut self, low: usize, high: usize) -> usize {
        if high <= low {
            return low;
        }
        self.rng.random_range(low..high)
    }
}

// Deterministic generator for replays and tests. Not for live sessions.
pub struct SeededRandom {
    rng: ChaCha8Rng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn int_in_range(&mut self, low: usize, high: usize) -> usize {
        if high <= low {
            return low;
        }
        self.rng.random_range(low..high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_range_is_empty_then_returns_low() {
        let mut random = SeededRandom::new(1);
        assert_eq!(random.int_in_range(4, 4), 4);
        assert_eq!(random.int_in_range(5, 2), 5);
    }

    #[test]
    fn when_sampling_then_values_stay_in_half_open_range() {
        let mut random = CryptoRandom::new();
        for _ in 0..1_000 {
            let value = random.int_in_range(2, 7);
            assert!((2..7).contains(&value));
        }
    }

    #[test]
    fn when_seeds_match_then_sequences_match() {
        let mut a = SeededRandom::new(42);
        let mut b = SeededRandom::new(42);
        let left: Vec<usize> = (0..32).map(|_| a.int_in_range(0, 100)).collect();
        let right: Vec<usize> = (0..32).map(|_| b.int_in_range(0, 100)).collect();
        assert_eq!(left, right);
    }
}
