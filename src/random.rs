//! Deterministic pseudorandom source for branch and repetition decisions.
//!
//! [`MersenneRandom`] is an MT19937 engine that a pattern walker calls to pick among
//! alternatives or repetition counts. Identical seeds and identical sequences of
//! `generate*` calls reproduce identical outputs on every platform.
//!
//! The engine is not cryptographically secure.

use std::fmt;

use rand::Rng;
use rand_core::{impls, RngCore, SeedableRng};
use tracing::{debug, trace};

use crate::RandomError;

const STATE_SIZE: usize = 624;
/// Segment boundaries of the twist. Slot `STATE_SIZE` aliases slot 0.
const TWIST_SPLITS: [usize; 3] = [0, 227, 397];
const INIT_MULTIPLIER: u32 = 0x6C07_8965;
const MATRIX_A: u32 = 0x9908_B0DF;
const UPPER_MASK: u32 = 0x8000_0000;
const LOWER_MASK: u32 = 0x7FFF_FFFF;

/// Lower bound used when none has been configured.
pub const DEFAULT_MIN: i64 = 0;
/// Upper bound used when none has been configured (the signed 32-bit maximum).
pub const DEFAULT_MAX: i64 = 2_147_483_647;

/// A seedable source of bounded integers.
///
/// This is the seam a pattern walker is generic over, so that tests can swap in a
/// scripted source.
pub trait Generator {
    /// Set the seed. State is rebuilt lazily on the next draw, and only if the seed changed.
    fn seed(&mut self, seed: u64);

    /// Set the seed from operating system entropy and return it.
    ///
    /// This is intentionally non-reproducible. Callers that need reproducible output
    /// must use [`Generator::seed`] with an explicit value (or record the returned seed).
    fn reseed_from_entropy(&mut self) -> u64;

    /// The configured default lower bound, or [`DEFAULT_MIN`] if unset.
    fn min(&self) -> i64;

    /// The configured default upper bound, or [`DEFAULT_MAX`] if unset.
    fn max(&self) -> i64;

    /// Configure the default lower bound.
    fn set_min(&mut self, min: i64);

    /// Configure the default upper bound.
    fn set_max(&mut self, max: i64);

    /// Draw a value in `[min, max]`, falling back to the configured defaults for `None`.
    ///
    /// Fails with [`RandomError::InvalidRange`] if the effective `max < min`.
    fn generate_in(&mut self, min: Option<i64>, max: Option<i64>) -> Result<i64, RandomError>;

    /// Draw a value within the configured default bounds.
    fn generate(&mut self) -> Result<i64, RandomError> {
        self.generate_in(None, None)
    }

    /// Draw a value in `[min, max]`.
    fn generate_range(&mut self, min: i64, max: i64) -> Result<i64, RandomError> {
        self.generate_in(Some(min), Some(max))
    }
}

/// MT19937 engine with lazily rebuilt state and configurable default bounds.
///
/// The state array is built and twisted once per seed. Draws walk the twisted
/// array with a cursor that wraps every 624 draws, so for a fixed seed the output
/// repeats with period 624. Changing the seed rebuilds the state but leaves the
/// cursor where it is.
///
/// # Examples
///
/// ```
/// use pattern_kernel::{Generator, MersenneRandom};
///
/// let mut random = MersenneRandom::new(42);
/// let draws: Vec<i64> = (0..5).map(|_| random.generate_range(0, 10).unwrap()).collect();
/// assert_eq!(draws, vec![6, 7, 9, 3, 2]);
/// ```
#[derive(Clone)]
pub struct MersenneRandom {
    seed: u64,
    /// Seed the current `state` was built from. `None` until the first draw.
    previous_seed: Option<u64>,
    state: Box<[u32; STATE_SIZE]>,
    cursor: usize,
    min: Option<i64>,
    max: Option<i64>,
}

impl MersenneRandom {
    /// Create an engine with an explicit seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            previous_seed: None,
            state: Box::new([0; STATE_SIZE]),
            cursor: 0,
            min: None,
            max: None,
        }
    }

    /// Create an engine seeded from operating system entropy.
    ///
    /// Output is not reproducible across runs unless the seed is read back with
    /// [`MersenneRandom::configured_seed`] and recorded.
    pub fn from_entropy() -> Self {
        let mut random = Self::new(0);
        random.reseed_from_entropy();
        random
    }

    /// The seed that the next draw will use.
    pub fn configured_seed(&self) -> u64 {
        self.seed
    }

    /// Index into the state array of the next draw.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Draw one tempered 32-bit word.
    fn next_word(&mut self) -> u32 {
        self.ensure_state();
        let word = self.state[self.cursor];
        self.cursor = (self.cursor + 1) % STATE_SIZE;
        temper(word)
    }

    fn ensure_state(&mut self) {
        if self.previous_seed == Some(self.seed) {
            return;
        }
        trace!(seed = self.seed, "rebuilding mersenne state");
        self.state[0] = (self.seed & 0xFFFF_FFFF) as u32;
        for i in 1..STATE_SIZE {
            let prev = self.state[i - 1];
            self.state[i] = INIT_MULTIPLIER
                .wrapping_mul(prev ^ (prev >> 30))
                .wrapping_add(i as u32);
        }
        twist(&mut self.state);
        self.previous_seed = Some(self.seed);
    }
}

fn twist(state: &mut [u32; STATE_SIZE]) {
    for j in 1..TWIST_SPLITS.len() {
        let previous = TWIST_SPLITS[j - 1];
        let offset = STATE_SIZE - TWIST_SPLITS[j];
        let end = TWIST_SPLITS[j] + previous;
        for i in previous..end {
            let y = (state[i] & UPPER_MASK) | (state[(i + 1) % STATE_SIZE] & LOWER_MASK);
            // First segment reads ahead, second reads the already twisted words behind.
            let partner = if previous == 0 { i + offset } else { i - offset };
            let odd = if y & 1 == 1 { MATRIX_A } else { 0 };
            state[i] = state[partner] ^ (y >> 1) ^ odd;
        }
    }
}

fn temper(mut y: u32) -> u32 {
    y ^= y >> 11;
    y ^= (y << 7) & 0x9D2C_5680;
    y ^= (y << 15) & 0xEFC6_0000;
    y ^= y >> 18;
    y
}

impl Generator for MersenneRandom {
    fn seed(&mut self, seed: u64) {
        self.seed = seed;
    }

    fn reseed_from_entropy(&mut self) -> u64 {
        let seed = rand::thread_rng().gen_range(0..=i64::MAX as u64);
        debug!(seed, "seeded mersenne engine from entropy");
        self.seed = seed;
        seed
    }

    fn min(&self) -> i64 {
        self.min.unwrap_or(DEFAULT_MIN)
    }

    fn max(&self) -> i64 {
        self.max.unwrap_or(DEFAULT_MAX)
    }

    fn set_min(&mut self, min: i64) {
        self.min = Some(min);
    }

    fn set_max(&mut self, max: i64) {
        self.max = Some(max);
    }

    fn generate_in(&mut self, min: Option<i64>, max: Option<i64>) -> Result<i64, RandomError> {
        let min = min.unwrap_or_else(|| Generator::min(self));
        let max = max.unwrap_or_else(|| Generator::max(self));
        if max < min {
            return Err(RandomError::InvalidRange { min, max });
        }
        let span = i128::from(max) - i128::from(min) + 1;
        let value = i128::from(self.next_word()) % span + i128::from(min);
        // value lies in [min, max], so it fits in i64.
        Ok(value as i64)
    }
}

impl RngCore for MersenneRandom {
    fn next_u32(&mut self) -> u32 {
        self.next_word()
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_u32(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for MersenneRandom {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(seed: u64) -> Self {
        Self::new(seed)
    }
}

impl fmt::Debug for MersenneRandom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MersenneRandom")
            .field("seed", &self.seed)
            .field("previous_seed", &self.previous_seed)
            .field("cursor", &self.cursor)
            .field("min", &self.min)
            .field("max", &self.max)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;

    fn draws(random: &mut MersenneRandom, n: usize, min: i64, max: i64) -> Vec<i64> {
        (0..n)
            .map(|_| random.generate_range(min, max).unwrap())
            .collect()
    }

    #[test]
    fn test_reference_vector_seed_42() {
        let mut random = MersenneRandom::new(42);
        assert_eq!(draws(&mut random, 5, 0, 10), vec![6, 7, 9, 3, 2]);
    }

    #[test]
    fn test_raw_words_match_mt19937() {
        let mut random = MersenneRandom::new(5489);
        assert_eq!(random.next_u32(), 3_499_211_612);
        assert_eq!(random.next_u32(), 581_869_302);

        let mut random = MersenneRandom::new(42);
        assert_eq!(random.next_u32(), 1_608_637_542);
        assert_eq!(random.next_u32(), 3_421_126_067);
    }

    #[test]
    fn test_seed_uses_low_32_bits() {
        let mut wide = MersenneRandom::new((1 << 32) + 42);
        let mut narrow = MersenneRandom::new(42);
        assert_eq!(draws(&mut wide, 20, 0, 1000), draws(&mut narrow, 20, 0, 1000));
    }

    #[test]
    fn test_determinism_across_instances() {
        let mut a = MersenneRandom::new(1234);
        let mut b = MersenneRandom::new(1234);
        let bounds = [(0, 1), (5, 9), (-3, 3), (0, 100_000), (7, 7)];
        for (min, max) in bounds.iter().cycle().take(200) {
            assert_eq!(
                a.generate_range(*min, *max).unwrap(),
                b.generate_range(*min, *max).unwrap()
            );
        }
    }

    #[test]
    fn test_range_property() {
        let mut rng = SmallRng::seed_from_u64(7);
        for trial in 0..10_000 {
            let seed: u64 = rng.gen();
            let (min, max) = random_bounds(&mut rng, trial);
            let mut random = MersenneRandom::new(seed);
            for _ in 0..rng.gen_range(1..8) {
                let value = random.generate_range(min, max).unwrap();
                assert!((min..=max).contains(&value), "{value} not in [{min}, {max}]");
            }
        }
    }

    #[test]
    fn test_range_property_across_wrap() {
        let mut rng = SmallRng::seed_from_u64(11);
        let mut random = MersenneRandom::new(rng.gen());
        for draw in 0..3 * STATE_SIZE + 17 {
            let (min, max) = random_bounds(&mut rng, draw);
            let value = random.generate_range(min, max).unwrap();
            assert!(
                (min..=max).contains(&value),
                "draw {draw}: {value} not in [{min}, {max}]"
            );
        }
        assert_eq!(random.cursor(), 17);
    }

    /// Bounds cycling through narrow spans, spans up to `u32::MAX` and spans wider
    /// than 2^32.
    fn random_bounds(rng: &mut SmallRng, i: usize) -> (i64, i64) {
        match i % 3 {
            0 => {
                let min = rng.gen_range(-1_000_000..1_000_000);
                (min, min + rng.gen_range(0..1_000))
            }
            1 => {
                let min = rng.gen_range(-(1 << 40)..1 << 40);
                (min, min + rng.gen_range(0..=i64::from(u32::MAX)))
            }
            _ => {
                let (a, b): (i64, i64) = (rng.gen(), rng.gen());
                (a.min(b), a.max(b))
            }
        }
    }

    #[test]
    fn test_extreme_bounds() {
        let mut random = MersenneRandom::new(3);
        for _ in 0..100 {
            random.generate_range(i64::MIN, i64::MAX).unwrap();
        }
        assert_eq!(random.generate_range(i64::MAX, i64::MAX), Ok(i64::MAX));
        assert_eq!(random.generate_range(i64::MIN, i64::MIN), Ok(i64::MIN));
    }

    #[test]
    fn test_invalid_range() {
        let mut random = MersenneRandom::new(42);
        assert_eq!(
            random.generate_range(10, 9),
            Err(RandomError::InvalidRange { min: 10, max: 9 })
        );
        // A rejected draw does not advance the cursor.
        assert_eq!(random.cursor(), 0);

        random.set_min(100);
        random.set_max(50);
        assert_eq!(
            random.generate(),
            Err(RandomError::InvalidRange { min: 100, max: 50 })
        );
    }

    #[test]
    fn test_default_bounds() {
        let mut random = MersenneRandom::new(42);
        assert_eq!(Generator::min(&random), 0);
        assert_eq!(Generator::max(&random), 2_147_483_647);
        // 1608637542 < 2^31, so the first draw is the raw word.
        assert_eq!(random.generate(), Ok(1_608_637_542));

        random.set_max(10);
        assert_eq!(Generator::max(&random), 10);
        assert_eq!(random.generate_in(None, None), Ok(7));
        assert_eq!(random.generate_in(Some(0), None), Ok(9));
    }

    #[test]
    fn test_period_is_state_size() {
        let mut random = MersenneRandom::new(42);
        let first: Vec<u32> = (0..STATE_SIZE).map(|_| random.next_u32()).collect();
        assert_eq!(random.cursor(), 0);
        assert_eq!(random.next_u32(), first[0]);
        assert_eq!(random.next_u32(), first[1]);
    }

    #[test]
    fn test_reseed_keeps_cursor() {
        let mut fresh = MersenneRandom::new(42);
        let expected = draws(&mut fresh, 5, 0, 10);

        let mut random = MersenneRandom::new(42);
        assert_eq!(draws(&mut random, 2, 0, 10), expected[..2]);
        random.seed(7);
        random.seed(42);
        assert_eq!(draws(&mut random, 3, 0, 10), expected[2..]);
    }

    #[test]
    fn test_reseed_changes_sequence() {
        let mut random = MersenneRandom::new(42);
        random.seed(43);
        let mut other = MersenneRandom::new(42);
        assert_ne!(draws(&mut random, 10, 0, 1 << 30), draws(&mut other, 10, 0, 1 << 30));
    }

    #[test]
    fn test_entropy_seed_is_recorded() {
        let mut random = MersenneRandom::from_entropy();
        let seed = random.configured_seed();
        assert!(seed <= i64::MAX as u64);
        let mut replay = MersenneRandom::new(seed);
        assert_eq!(draws(&mut random, 10, 0, 99), draws(&mut replay, 10, 0, 99));
    }

    #[test]
    fn test_seedable_rng() {
        let mut a = MersenneRandom::seed_from_u64(42);
        let mut b = MersenneRandom::from_seed(42u64.to_le_bytes());
        assert_eq!(a.gen_range(0..100u32), b.gen_range(0..100u32));
    }
}
