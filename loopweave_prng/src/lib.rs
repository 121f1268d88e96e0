// Deterministic, portable pseudo-random number generator.
//
// Implements xoshiro256++ (Blackman & Vigna, 2019) with SplitMix64 seeding.
// A seed reproduces the same patterns on every platform.
//
// This crate is the single source of randomness for `loopweave_engine`:
// position selection, pitch choice, mutation draws and generator selection
// all draw from a `StepRng`. Every engine operation is a pure function of its
// inputs plus the generator state.
//
// On top of the raw generator this crate provides the distribution helpers
// the engine needs: uniform ranges, Bernoulli trials, exponential and
// geometric gaps (for the Poisson/geometric timing models), Fisher–Yates
// shuffles and sampling without replacement.
//
// **Critical constraint: determinism.** The core generator (`next_u64`) must
// produce identical output given the same prior state, regardless of
// platform, compiler version, or optimization level. Floating-point is only
// used in the derived distribution helpers, never in the state update.

use serde::{Deserialize, Serialize};

/// Xoshiro256++ PRNG: the engine's sole source of randomness.
///
/// The engine owns one `StepRng`, seeded from its configuration. Tests seed
/// their own instances to get reproducible streams.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepRng {
    s: [u64; 4],
}

impl StepRng {
    /// Create a new PRNG seeded from a `u64`.
    ///
    /// Uses SplitMix64 to expand the seed into the 256-bit internal state.
    /// Two `StepRng` instances created with the same seed will produce
    /// identical output sequences.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Generate a uniform `f64` in [0, 1).
    ///
    /// Uses the upper 53 bits of a `u64` to fill the mantissa.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Generate a uniform random integer in `[low, high)`.
    ///
    /// Uses rejection sampling to avoid modulo bias.
    /// Panics if `low >= high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: low must be less than high");
        let range = high - low;
        if range.is_power_of_two() {
            return low + (self.next_u64() & (range - 1));
        }
        // Rejection sampling to avoid modulo bias.
        let threshold = range.wrapping_neg() % range; // = (2^64 - range) % range
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % range);
            }
        }
    }

    /// Generate a uniform random `usize` in `[low, high)`.
    ///
    /// Panics if `low >= high`.
    pub fn range_usize(&mut self, low: usize, high: usize) -> usize {
        self.range_u64(low as u64, high as u64) as usize
    }

    /// Generate a uniform random `usize` in `[low, high]` (inclusive on both ends).
    ///
    /// Panics if `low > high`.
    pub fn range_usize_inclusive(&mut self, low: usize, high: usize) -> usize {
        assert!(low <= high, "range_usize_inclusive: low must be <= high");
        self.range_u64(low as u64, high as u64 + 1) as usize
    }

    /// Generate a uniform random `i32` in `[low, high]` (inclusive on both ends).
    ///
    /// Used for signed offsets such as timing jitter and degree steps.
    /// Panics if `low > high`.
    pub fn range_i32_inclusive(&mut self, low: i32, high: i32) -> i32 {
        assert!(low <= high, "range_i32_inclusive: low must be <= high");
        let span = (high as i64 - low as i64) as u64 + 1;
        (low as i64 + self.range_u64(0, span) as i64) as i32
    }

    /// Return `true` with probability `p`, `false` otherwise.
    ///
    /// `p <= 0.0` always returns false, `p >= 1.0` always returns true.
    pub fn random_bool(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Sample an exponentially distributed value with the given rate
    /// (mean `1 / rate`) by inversion.
    ///
    /// Panics if `rate <= 0.0`.
    pub fn exponential(&mut self, rate: f64) -> f64 {
        assert!(rate > 0.0, "exponential: rate must be positive");
        // 1 - u is in (0, 1], so the logarithm is finite.
        -(1.0 - self.next_f64()).ln() / rate
    }

    /// Sample the number of Bernoulli(`p`) trials up to and including the
    /// first success. Always at least 1; saturates at `u64::MAX` when `p`
    /// is so small the count is not representable.
    ///
    /// Panics if `p <= 0.0`.
    pub fn geometric(&mut self, p: f64) -> u64 {
        assert!(p > 0.0, "geometric: p must be positive");
        if p >= 1.0 {
            return 1;
        }
        let u = 1.0 - self.next_f64();
        // ln(1 - p) via ln_1p stays nonzero for p below f64 epsilon.
        let trials = (u.ln() / (-p).ln_1p()).ceil();
        if !trials.is_finite() {
            u64::MAX
        } else if trials < 1.0 {
            1
        } else {
            trials as u64
        }
    }

    /// Shuffle a slice in place (Fisher–Yates).
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.range_usize_inclusive(0, i);
            items.swap(i, j);
        }
    }

    /// Draw `count` distinct indices from `0..n`, uniformly without
    /// replacement, in draw order. `count` is capped at `n`.
    pub fn sample_indices(&mut self, n: usize, count: usize) -> Vec<usize> {
        let count = count.min(n);
        let mut pool: Vec<usize> = (0..n).collect();
        for i in 0..count {
            let j = self.range_usize(i, n);
            pool.swap(i, j);
        }
        pool.truncate(count);
        pool
    }
}

/// SplitMix64, used only for seeding xoshiro256++ from a single `u64`.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn determinism_same_seed_same_output() {
        let mut a = StepRng::new(42);
        let mut b = StepRng::new(42);
        for _ in 0..1000 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_different_output() {
        let mut a = StepRng::new(42);
        let mut b = StepRng::new(43);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn f64_in_unit_range() {
        let mut rng = StepRng::new(12345);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "f64 out of range: {v}");
        }
    }

    #[test]
    fn range_usize_within_bounds() {
        let mut rng = StepRng::new(555);
        for _ in 0..10_000 {
            let v = rng.range_usize(5, 15);
            assert!((5..15).contains(&v), "range_usize out of range: {v}");
        }
    }

    #[test]
    fn range_i32_inclusive_reaches_both_ends() {
        let mut rng = StepRng::new(666);
        let mut saw_low = false;
        let mut saw_high = false;
        for _ in 0..10_000 {
            let v = rng.range_i32_inclusive(-2, 2);
            assert!((-2..=2).contains(&v), "range_i32_inclusive out of range: {v}");
            saw_low |= v == -2;
            saw_high |= v == 2;
        }
        assert!(saw_low && saw_high, "both ends should be reachable");
    }

    #[test]
    fn random_bool_distribution() {
        let mut rng = StepRng::new(42);
        let n = 10_000;
        let true_count = (0..n).filter(|_| rng.random_bool(0.5)).count();
        let pct = true_count as f64 / n as f64;
        assert!(
            (0.45..0.55).contains(&pct),
            "random_bool(0.5) should be ~50%, got {:.1}%",
            pct * 100.0
        );
    }

    #[test]
    fn random_bool_extremes() {
        let mut rng = StepRng::new(42);
        for _ in 0..100 {
            assert!(!rng.random_bool(0.0));
            assert!(rng.random_bool(1.0));
        }
    }

    #[test]
    fn exponential_mean_matches_rate() {
        let mut rng = StepRng::new(7);
        let n = 20_000;
        let sum: f64 = (0..n).map(|_| rng.exponential(0.25)).sum();
        let mean = sum / n as f64;
        // Mean should be ~4.0.
        assert!((3.7..4.3).contains(&mean), "exponential mean was {mean}");
    }

    #[test]
    fn geometric_is_at_least_one() {
        let mut rng = StepRng::new(9);
        for _ in 0..10_000 {
            assert!(rng.geometric(0.3) >= 1);
        }
        assert_eq!(rng.geometric(1.0), 1);
    }

    #[test]
    fn geometric_tiny_p_gives_huge_gaps() {
        let mut rng = StepRng::new(13);
        for _ in 0..1_000 {
            // Mean gap is 1e17; anything below a million would mean the
            // divisor collapsed.
            assert!(rng.geometric(1e-17) > 1_000_000);
        }
        assert!(rng.geometric(f64::MIN_POSITIVE) > 1_000_000);
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = StepRng::new(11);
        let mut items: Vec<u32> = (0..32).collect();
        rng.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..32).collect::<Vec<_>>());
    }

    #[test]
    fn sample_indices_distinct_and_capped() {
        let mut rng = StepRng::new(13);
        let picks = rng.sample_indices(10, 4);
        assert_eq!(picks.len(), 4);
        let mut dedup = picks.clone();
        dedup.sort_unstable();
        dedup.dedup();
        assert_eq!(dedup.len(), 4);
        assert!(picks.iter().all(|&i| i < 10));

        assert_eq!(rng.sample_indices(3, 10).len(), 3);
        assert!(rng.sample_indices(0, 2).is_empty());
    }

    #[test]
    fn serialization_roundtrip() {
        let mut rng = StepRng::new(42);
        for _ in 0..100 {
            rng.next_u64();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: StepRng = serde_json::from_str(&json).unwrap();
        for _ in 0..100 {
            assert_eq!(rng.next_u64(), restored.next_u64());
        }
    }
}
