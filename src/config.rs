//! Builder-style configuration for [`MersenneRandom`].

use crate::{Generator, MersenneRandom, RandomError};

/// Configuration for constructing an engine.
///
/// # Example
/// ```
/// use pattern_kernel::{EngineConfig, Generator};
///
/// let mut random = EngineConfig::default().with_seed(42).with_range(0, 10).build()?;
/// assert_eq!(random.generate()?, 6);
/// # Ok::<(), pattern_kernel::RandomError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Seed for reproducibility (None = drawn from entropy at build time).
    pub seed: Option<u64>,
    /// Default lower bound (None = [`DEFAULT_MIN`](crate::DEFAULT_MIN)).
    pub min: Option<i64>,
    /// Default upper bound (None = [`DEFAULT_MAX`](crate::DEFAULT_MAX)).
    pub max: Option<i64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::seeded(0)
    }
}

impl EngineConfig {
    /// A configuration with a fixed seed and default bounds.
    pub const fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            min: None,
            max: None,
        }
    }

    /// Use a fixed seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Draw the seed from entropy at build time. Output will not be reproducible.
    pub fn with_random_seed(mut self) -> Self {
        self.seed = None;
        self
    }

    /// Set the default lower bound.
    pub fn with_min(mut self, min: i64) -> Self {
        self.min = Some(min);
        self
    }

    /// Set the default upper bound.
    pub fn with_max(mut self, max: i64) -> Self {
        self.max = Some(max);
        self
    }

    /// Set both default bounds.
    pub fn with_range(self, min: i64, max: i64) -> Self {
        self.with_min(min).with_max(max)
    }

    /// Build the engine, rejecting bounds where the effective `max < min`.
    pub fn build(&self) -> Result<MersenneRandom, RandomError> {
        let mut random = match self.seed {
            Some(seed) => MersenneRandom::new(seed),
            None => MersenneRandom::from_entropy(),
        };
        if let Some(min) = self.min {
            random.set_min(min);
        }
        if let Some(max) = self.max {
            random.set_max(max);
        }
        let (min, max) = (Generator::min(&random), Generator::max(&random));
        if max < min {
            return Err(RandomError::InvalidRange { min, max });
        }
        Ok(random)
    }
}
