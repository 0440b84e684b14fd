//! Seedable RNG service.
//!
//! All randomness in the engine flows through [`GachaRng`] so a fixed seed
//! reproduces every pull, shiny roll, and ability pick.

use rand::{Rng, RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use sha3::{Digest, Sha3_256};

use crate::error::{GachaError, GachaResult};

/// Deterministic RNG backed by xoshiro256++
#[derive(Debug, Clone)]
pub struct GachaRng {
    inner: Xoshiro256PlusPlus,
}

impl GachaRng {
    /// Create an RNG from a fixed seed (same seed, same sequence)
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    /// Create an RNG seeded from the OS entropy source
    pub fn from_entropy() -> Self {
        Self::from_seed(rand::random())
    }

    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Uniform f64 in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Uniform integer in [min, max] (returns `min` if the range is empty)
    pub fn range_u32(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        self.inner.gen_range(min..=max)
    }

    /// Independent flag with the given probability of `true`
    pub fn bernoulli(&mut self, probability: f64) -> bool {
        if probability.is_nan() || probability <= 0.0 {
            return false;
        }
        if probability >= 1.0 {
            return true;
        }
        self.next_f64() < probability
    }

    /// Weighted draw over an ordered `(label, weight)` table.
    ///
    /// Zero-weight entries are never selected. Fails with `InvalidWeights`
    /// when the table is empty, sums to zero, or holds a negative or
    /// non-finite weight.
    pub fn draw<L: Clone>(&mut self, weights: &[(L, f64)]) -> GachaResult<L> {
        let total = total_weight(weights)?;

        let roll = self.next_f64() * total;
        let mut accumulated = 0.0;
        let mut last_positive = None;

        for (label, weight) in weights {
            if *weight <= 0.0 {
                continue;
            }
            accumulated += weight;
            last_positive = Some(label);
            if roll < accumulated {
                return Ok(label.clone());
            }
        }

        // Float rounding can leave roll == total; the last live entry owns that edge.
        last_positive
            .cloned()
            .ok_or_else(|| GachaError::InvalidWeights("no positive weight".into()))
    }

    /// Uniform pick from a slice
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.inner.gen_range(0..items.len());
        items.get(idx)
    }

    /// Draw `k` distinct elements without replacement (partial Fisher-Yates).
    /// Returns the whole pool, shuffled, when `k >= pool.len()`.
    pub fn sample_distinct<T: Clone>(&mut self, pool: &[T], k: usize) -> Vec<T> {
        let mut indices: Vec<usize> = (0..pool.len()).collect();
        let take = k.min(pool.len());
        for i in 0..take {
            let j = self.inner.gen_range(i..indices.len());
            indices.swap(i, j);
        }
        indices[..take].iter().map(|&i| pool[i].clone()).collect()
    }
}

/// Mix a base seed with arbitrary key material into a new 64-bit seed.
///
/// Streams derived from different parts are unrelated, so two owners (or two
/// points in one owner's history) never share a sequence.
pub fn derive_seed(base: u64, parts: &[&[u8]]) -> u64 {
    let mut hasher = Sha3_256::new();
    hasher.update(base.to_le_bytes());
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    let digest = hasher.finalize();
    let mut first = [0u8; 8];
    first.copy_from_slice(&digest[0..8]);
    u64::from_le_bytes(first)
}

/// Validate a weight table and return its total
pub fn total_weight<L>(weights: &[(L, f64)]) -> GachaResult<f64> {
    if weights.is_empty() {
        return Err(GachaError::InvalidWeights("empty weight table".into()));
    }
    if let Some((_, bad)) = weights.iter().find(|(_, w)| !w.is_finite() || *w < 0.0) {
        return Err(GachaError::InvalidWeights(format!(
            "weight {} is negative or not finite",
            bad
        )));
    }
    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return Err(GachaError::InvalidWeights("all weights are zero".into()));
    }
    Ok(total)
}
