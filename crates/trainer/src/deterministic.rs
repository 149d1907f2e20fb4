//! Deterministic utilities for reproducible training
//!
//! Provides an LCG-based RNG, seed mixing and tie-breaking so that the same
//! seed grows the same forest on every platform and run.

use std::num::Wrapping;

/// Linear Congruential Generator for deterministic pseudo-randomness
/// Uses constants from Numerical Recipes (glibc)
#[derive(Clone, Debug)]
pub struct LcgRng {
    state: Wrapping<i64>,
}

impl LcgRng {
    // LCG constants (compatible with glibc)
    const MULTIPLIER: i64 = 1103515245;
    const INCREMENT: i64 = 12345;
    const MODULUS: i64 = 1 << 31;

    pub fn new(seed: i64) -> Self {
        Self {
            state: Wrapping(seed.rem_euclid(Self::MODULUS)),
        }
    }

    /// Generate next random i64 in range [0, MODULUS)
    pub fn next_i64(&mut self) -> i64 {
        self.state = self.state * Wrapping(Self::MULTIPLIER) + Wrapping(Self::INCREMENT);
        self.state.0 & (Self::MODULUS - 1)
    }

    /// Generate random value in range [0, max)
    ///
    /// Scales by the high bits; the low bits of a power-of-two LCG cycle
    /// with short periods.
    pub fn next_range(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        ((self.next_i64() as u128 * max as u128) >> 31) as usize
    }

    /// Fisher-Yates shuffle
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_range(i + 1);
            items.swap(i, j);
        }
    }

    /// Draw `n` indices from [0, n) with replacement
    pub fn bootstrap(&mut self, n: usize) -> Vec<usize> {
        (0..n).map(|_| self.next_range(n)).collect()
    }
}

/// Derive an independent seed for sub-stream `stream` of `seed`
pub fn mix_seed(seed: i64, stream: u64) -> i64 {
    xxhash64_i64(&[stream as i64], seed)
}

/// Deterministic xxhash64-like hash in pure i64 arithmetic
pub fn xxhash64_i64(data: &[i64], seed: i64) -> i64 {
    const PRIME1: i64 = 0x9E3779B185EBCA87_u64 as i64;
    const PRIME2: i64 = 0xC2B2AE3D27D4EB4F_u64 as i64;
    const PRIME3: i64 = 0x165667B19E3779F9_u64 as i64;
    const PRIME5: i64 = 0x85EBCA77C2B2AE63_u64 as i64;

    let mut h = seed.wrapping_add(PRIME5);

    for &val in data {
        h = h.wrapping_add(val.wrapping_mul(PRIME3));
        h = h.rotate_left(17).wrapping_mul(PRIME2);
    }

    h ^= ((h as u64) >> 33) as i64;
    h = h.wrapping_mul(PRIME1);
    h ^= ((h as u64) >> 29) as i64;
    h = h.wrapping_mul(PRIME2);
    h ^= ((h as u64) >> 32) as i64;

    h
}

/// Deterministic tie-breaker for split selection
/// Orders equally good splits by (feature_idx, candidate_idx)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SplitTieBreaker {
    pub feature_idx: usize,
    pub candidate_idx: usize,
}

impl SplitTieBreaker {
    pub fn new(feature_idx: usize, candidate_idx: usize) -> Self {
        Self {
            feature_idx,
            candidate_idx,
        }
    }
}
