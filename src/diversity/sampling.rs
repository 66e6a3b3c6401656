//! Bounded uniform sampling of table rows.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Uniform sampler without replacement, capped at `sample_size` items.
///
/// The output order is the shuffled order, so sampling scrambles a table
/// even when every row survives.
#[derive(Debug, Clone)]
pub struct BoundedSampler {
    /// Maximum number of items kept.
    sample_size: usize,

    /// Random seed for reproducibility (None = non-deterministic).
    seed: Option<u64>,
}

impl BoundedSampler {
    pub fn new(sample_size: usize) -> Self {
        Self {
            sample_size,
            seed: None,
        }
    }

    /// Sets a random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets an optional seed; `None` keeps sampling non-deterministic.
    pub fn with_optional_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Keeps `min(items.len(), sample_size)` items chosen uniformly at random.
    pub fn sample<T>(&self, items: Vec<T>) -> Vec<T> {
        if items.is_empty() || self.sample_size == 0 {
            return Vec::new();
        }

        let mut rng = self.create_rng();
        let mut items = items;
        items.shuffle(&mut rng);
        items.truncate(self.sample_size);
        items
    }

    fn create_rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_sample_caps_size() {
        let sampler = BoundedSampler::new(10).with_seed(42);
        let sampled = sampler.sample((0..100).collect::<Vec<u32>>());

        assert_eq!(sampled.len(), 10);
        let unique: HashSet<_> = sampled.iter().collect();
        assert_eq!(unique.len(), 10, "sampling is without replacement");
    }

    #[test]
    fn test_sample_smaller_pool_keeps_everything() {
        let sampler = BoundedSampler::new(2000).with_seed(1);
        let mut sampled = sampler.sample(vec![3, 1, 2]);
        sampled.sort_unstable();
        assert_eq!(sampled, vec![1, 2, 3]);
    }

    #[test]
    fn test_seed_reproducible() {
        let pool: Vec<u32> = (0..50).collect();
        let a = BoundedSampler::new(5).with_seed(7).sample(pool.clone());
        let b = BoundedSampler::new(5).with_seed(7).sample(pool);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(BoundedSampler::new(5).sample(Vec::<u32>::new()).is_empty());
        assert!(BoundedSampler::new(0).sample(vec![1, 2, 3]).is_empty());
    }
}
