use std::sync::Arc;

use parking_lot::Mutex;

use crate::{Generator, MersenneRandom, RandomError};

/// SharedRandom is a cloneable, lock-guarded handle to one [`MersenneRandom`].
///
/// Clones share the same engine and cursor, so draws from several threads are
/// interleaved in lock order. Use one [`MersenneRandom`] per worker instead when
/// the output must be reproducible.
#[derive(Debug, Clone)]
pub struct SharedRandom {
    inner: Arc<Mutex<MersenneRandom>>,
}

impl SharedRandom {
    /// Wrap an engine.
    pub fn new(random: MersenneRandom) -> Self {
        Self {
            inner: Arc::new(Mutex::new(random)),
        }
    }

    /// Run `f` with exclusive access to the engine, e.g. for a batch of draws
    /// that must not interleave with other threads.
    pub fn with<R>(&self, f: impl FnOnce(&mut MersenneRandom) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl From<MersenneRandom> for SharedRandom {
    fn from(random: MersenneRandom) -> Self {
        Self::new(random)
    }
}

impl Generator for SharedRandom {
    fn seed(&mut self, seed: u64) {
        self.inner.lock().seed(seed);
    }

    fn reseed_from_entropy(&mut self) -> u64 {
        self.inner.lock().reseed_from_entropy()
    }

    fn min(&self) -> i64 {
        Generator::min(&*self.inner.lock())
    }

    fn max(&self) -> i64 {
        Generator::max(&*self.inner.lock())
    }

    fn set_min(&mut self, min: i64) {
        self.inner.lock().set_min(min);
    }

    fn set_max(&mut self, max: i64) {
        self.inner.lock().set_max(max);
    }

    fn generate_in(&mut self, min: Option<i64>, max: Option<i64>) -> Result<i64, RandomError> {
        self.inner.lock().generate_in(min, max)
    }
}

#[test]
fn test_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<SharedRandom>();
    assert_sync::<SharedRandom>();
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn test_clones_share_cursor() {
        let mut a = SharedRandom::new(MersenneRandom::new(42));
        let mut b = a.clone();
        assert_eq!(a.generate_range(0, 10), Ok(6));
        assert_eq!(b.generate_range(0, 10), Ok(7));
        assert_eq!(a.with(|random| random.cursor()), 2);
    }

    #[test]
    fn test_threads_draw_the_whole_sequence() {
        let shared = SharedRandom::new(MersenneRandom::new(42));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let mut shared = shared.clone();
                thread::spawn(move || {
                    (0..100)
                        .map(|_| shared.generate_range(0, 1 << 20).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let mut drawn: Vec<i64> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();
        drawn.sort_unstable();

        let mut expected: Vec<i64> = {
            let mut random = MersenneRandom::new(42);
            (0..400)
                .map(|_| random.generate_range(0, 1 << 20).unwrap())
                .collect()
        };
        expected.sort_unstable();
        assert_eq!(drawn, expected);
    }
}
