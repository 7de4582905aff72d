//! Deterministic, injectable randomness.
//!
//! Every random operation in the workspace (node sampling, disruption-day
//! coin flips, penalty and noise draws, forest bootstrapping) takes an
//! explicit `&mut SimRng`.  A run is reproduced exactly by reusing its seed.
//!
//! # Seed derivation
//!
//! Child generators are seeded by:
//!
//!   seed = parent.next_u64() XOR (offset * MIXING_CONSTANT)
//!
//! with the golden-ratio constant below, so neighbouring offsets land far
//! apart in seed space.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Seeded RNG used by the simulator and the model trainer.
///
/// Not `Sync`: give each worker its own generator via [`child`](Self::child).
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Independent generator for stream `offset` (one per tree, one per
    /// pipeline stage).
    pub fn child(&mut self, offset: u64) -> SimRng {
        let child_seed: u64 = self.0.r#gen::<u64>() ^ offset.wrapping_mul(MIXING_CONSTANT);
        SimRng(SmallRng::seed_from_u64(child_seed))
    }

    /// Expose the inner `SmallRng` for use with `rand` distribution types.
    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.0.r#gen()
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// Bernoulli draw; `p` is clamped into `[0, 1]`.
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Uniform draw from `[low, low + width)`; returns `low` when `width` is 0.
    #[inline]
    pub fn uniform(&mut self, low: f64, width: f64) -> f64 {
        low + width * self.0.r#gen::<f64>()
    }

    /// Normally distributed sample (Box–Muller transform).
    pub fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        // 1 - U keeps the argument of ln strictly positive.
        let u1: f64 = 1.0 - self.0.r#gen::<f64>();
        let u2: f64 = self.0.r#gen::<f64>();
        let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
        mean + std_dev * z
    }

    /// Choose a random element from a slice.  `None` if the slice is empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.0)
    }

    /// Choose two elements at distinct positions.  `None` if `slice.len() < 2`.
    pub fn choose_pair<T: Copy>(&mut self, slice: &[T]) -> Option<(T, T)> {
        if slice.len() < 2 {
            return None;
        }
        let picked = rand::seq::index::sample(&mut self.0, slice.len(), 2);
        Some((slice[picked.index(0)], slice[picked.index(1)]))
    }

    /// Up to `k` elements drawn without replacement, in random order.
    pub fn sample<T: Copy>(&mut self, slice: &[T], k: usize) -> Vec<T> {
        let k = k.min(slice.len());
        rand::seq::index::sample(&mut self.0, slice.len(), k)
            .into_iter()
            .map(|i| slice[i])
            .collect()
    }

    /// `n` indices drawn uniformly *with* replacement from `0..len`
    /// (bootstrap resampling).
    pub fn bootstrap_indices(&mut self, len: usize, n: usize) -> Vec<usize> {
        if len == 0 {
            return Vec::new();
        }
        (0..n).map(|_| self.0.gen_range(0..len)).collect()
    }
}
