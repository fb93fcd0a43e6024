//! Sources of uniform randomness for the Metropolis sampler.

use rand::rngs::{StdRng, ThreadRng};
use rand::{RngExt, SeedableRng};

/// Uniform draws needed by the sampler: move selection and the trial value.
pub trait UniformSource {
    /// Draws a value in [0, 1).
    fn next_probability(&mut self) -> f64;

    /// Draws an index in `0..upper`. `upper` is never zero.
    fn next_index(&mut self, upper: usize) -> usize;
}

/// A [`UniformSource`] backed by a `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

impl<R> RngSource<R> {
    /// Wraps an existing generator.
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Consumes the source and returns the generator.
    pub fn into_inner(self) -> R {
        self.rng
    }
}

impl RngSource<ThreadRng> {
    /// Source backed by the thread-local generator.
    #[must_use]
    pub fn thread() -> Self {
        Self::new(rand::rng())
    }
}

impl Default for RngSource<ThreadRng> {
    fn default() -> Self {
        Self::thread()
    }
}

impl RngSource<StdRng> {
    /// Reproducible source for a given seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: RngExt> UniformSource for RngSource<R> {
    fn next_probability(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    fn next_index(&mut self, upper: usize) -> usize {
        self.rng.random_range(0..upper)
    }
}

/// Replays scripted draws, cycling when exhausted.
///
/// Used to force accept/reject decisions in tests and demos.
#[derive(Debug, Clone)]
pub struct SequenceSource {
    probabilities: Vec<f64>,
    indices: Vec<usize>,
    next_probability: usize,
    next_index: usize,
}

impl SequenceSource {
    /// Creates a source replaying `probabilities` and `indices`.
    ///
    /// An empty list yields 0.0 (or index 0) on every draw. Indices are
    /// reduced modulo the requested bound.
    #[must_use]
    pub const fn new(probabilities: Vec<f64>, indices: Vec<usize>) -> Self {
        Self {
            probabilities,
            indices,
            next_probability: 0,
            next_index: 0,
        }
    }
}

impl UniformSource for SequenceSource {
    fn next_probability(&mut self) -> f64 {
        if self.probabilities.is_empty() {
            return 0.0;
        }
        let value = self.probabilities[self.next_probability % self.probabilities.len()];
        self.next_probability += 1;
        value
    }

    fn next_index(&mut self, upper: usize) -> usize {
        if self.indices.is_empty() || upper == 0 {
            return 0;
        }
        let value = self.indices[self.next_index % self.indices.len()];
        self.next_index += 1;
        value % upper
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_source_range() {
        let mut source = RngSource::thread();
        for _ in 0..100 {
            let p = source.next_probability();
            assert!((0.0..1.0).contains(&p));
            assert!(source.next_index(5) < 5);
        }
    }

    #[test]
    fn test_seeded_sources_agree() {
        let mut first = RngSource::seeded(42);
        let mut second = RngSource::seeded(42);
        for _ in 0..20 {
            assert_eq!(first.next_index(1000), second.next_index(1000));
            assert!((first.next_probability() - second.next_probability()).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_sequence_source_cycles() {
        let mut source = SequenceSource::new(vec![0.1, 0.9], vec![4, 1]);
        assert!((source.next_probability() - 0.1).abs() < f64::EPSILON);
        assert!((source.next_probability() - 0.9).abs() < f64::EPSILON);
        assert!((source.next_probability() - 0.1).abs() < f64::EPSILON);
        assert_eq!(source.next_index(3), 1);
        assert_eq!(source.next_index(3), 1);
    }
}
