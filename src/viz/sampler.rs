//! Probability source for the staleness-refresh sampling.
//!
//! Sampling is injected rather than drawn from a global RNG so tests can pin
//! the outcome.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Bernoulli trial source.
pub trait Sampler: Send {
    /// Returns true with the given probability (clamped to [0, 1]).
    fn sample(&mut self, probability: f64) -> bool;
}

/// Sampler backed by a `rand` RNG.
pub struct RngSampler<R: Rng + Send> {
    rng: R,
}

impl<R: Rng + Send> RngSampler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSampler<StdRng> {
    /// Seeded when `seed` is given, otherwise seeded from OS entropy.
    pub fn from_seed(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl<R: Rng + Send> Sampler for RngSampler<R> {
    fn sample(&mut self, probability: f64) -> bool {
        if probability <= 0.0 || probability.is_nan() {
            return false;
        }
        if probability >= 1.0 {
            return true;
        }
        self.rng.gen_bool(probability)
    }
}

/// Sampler with a fixed outcome, ignoring the probability.
#[derive(Debug, Clone, Copy)]
pub struct FixedSampler(pub bool);

impl Sampler for FixedSampler {
    fn sample(&mut self, _probability: f64) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extreme_probabilities_are_deterministic() {
        let mut s = RngSampler::from_seed(Some(7));
        assert!((0..1000).all(|_| !s.sample(0.0)));
        assert!((0..1000).all(|_| s.sample(1.0)));
        assert!(!s.sample(-1.0));
        assert!(s.sample(2.0));
    }

    #[test]
    fn test_seeded_samplers_agree() {
        let mut a = RngSampler::from_seed(Some(42));
        let mut b = RngSampler::from_seed(Some(42));
        let xs: Vec<bool> = (0..200).map(|_| a.sample(0.3)).collect();
        let ys: Vec<bool> = (0..200).map(|_| b.sample(0.3)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_rate_is_roughly_respected() {
        let mut s = RngSampler::from_seed(Some(1));
        let hits = (0..10_000).filter(|_| s.sample(0.02)).count();
        assert!(hits > 100 && hits < 350, "hits = {}", hits);
    }

    #[test]
    fn test_fixed_sampler() {
        assert!(FixedSampler(true).sample(0.0));
        assert!(!FixedSampler(false).sample(1.0));
    }
}
