//! Deterministic utilities for reproducible training
//!
//! Provides an LCG-based RNG and a seeded train/test split so that re-running
//! training on an unchanged CSV reproduces identical partitions, and
//! therefore identical metrics, on every platform.

use serde::{Deserialize, Serialize};
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

    pub fn new(seed: u64) -> Self {
        Self {
            state: Wrapping((seed % Self::MODULUS as u64) as i64),
        }
    }

    /// Generate next random i64 in range [0, MODULUS)
    pub fn next_i64(&mut self) -> i64 {
        self.state = self.state * Wrapping(Self::MULTIPLIER) + Wrapping(Self::INCREMENT);
        self.state.0 & (Self::MODULUS - 1)
    }

    /// Generate random index in range [0, max)
    pub fn next_index(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        (self.next_i64() as u64 % max as u64) as usize
    }

    /// Fisher-Yates shuffle driven by this generator.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_index(i + 1);
            items.swap(i, j);
        }
    }
}

/// Hold-out split configuration, echoed verbatim into the metrics record.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of rows held out for evaluation, in (0, 1).
    pub test_size: f64,
    pub shuffle: bool,
    pub random_state: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            shuffle: true,
            random_state: 42,
        }
    }
}

/// Row indices of each partition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl SplitConfig {
    /// Number of rows held out: `ceil(n * test_size)`, leaving at least one
    /// training row whenever `n > 1`.
    pub fn test_count(&self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        let wanted = (n as f64 * self.test_size).ceil() as usize;
        wanted.clamp(1, n.saturating_sub(1).max(1))
    }

    /// Split `0..n`: the first `test_count` indices of the (optionally
    /// shuffled) ordering form the test partition, the rest the train one.
    pub fn split(&self, n: usize) -> SplitIndices {
        let mut order: Vec<usize> = (0..n).collect();
        if self.shuffle {
            LcgRng::new(self.random_state).shuffle(&mut order);
        }

        let n_test = self.test_count(n);
        let train = order.split_off(n_test);
        SplitIndices { train, test: order }
    }
}
