// src/grammar/rng.rs
//! Randomness sources for grammar expansion and layout.
//!
//! Every expansion call receives a `&mut dyn RandomSource`. A generation root may
//! carry its own seeded generator; without one, the process-wide shared source is used.

use std::sync::{Mutex, PoisonError};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Uniform integer/float draws used by every rule.
pub trait RandomSource {
    /// Uniform integer in `[0, bound)`. A bound of 0 yields 0.
    fn next_int(&mut self, bound: usize) -> usize;

    /// Uniform float in `[0, 1)`.
    fn next_float(&mut self) -> f32;

    /// `true` with probability `p`.
    #[inline]
    fn chance(&mut self, p: f32) -> bool {
        self.next_float() < p
    }

    /// Uniform float in `[lo, hi)`; returns `lo` when the range is empty.
    #[inline]
    fn range_f32(&mut self, lo: f32, hi: f32) -> f32 {
        if hi <= lo { return lo; }
        lo + self.next_float() * (hi - lo)
    }

    /// Uniform integer in `[lo, hi]` (inclusive).
    #[inline]
    fn range_inclusive(&mut self, lo: usize, hi: usize) -> usize {
        if hi <= lo { return lo; }
        lo + self.next_int(hi - lo + 1)
    }
}

impl RandomSource for ChaCha8Rng {
    fn next_int(&mut self, bound: usize) -> usize {
        if bound == 0 { return 0; }
        self.random_range(0..bound)
    }

    fn next_float(&mut self) -> f32 {
        self.random::<f32>()
    }
}

/// Deterministic generator for a seed.
#[inline]
pub fn seeded(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Mix a base seed with two indices (block, slot) into a per-building seed.
#[inline]
pub fn mix_seed(seed: u64, a: u32, b: u32) -> u64 {
    seed ^ ((a as u64) << 16) ^ ((b as u64) << 40) ^ 0x9E37_79B9_7F4A_7C15u64
}

// ---------- Process-wide fallback ----------

static SHARED: Mutex<Option<ChaCha8Rng>> = Mutex::new(None);

fn with_shared<R>(f: impl FnOnce(&mut ChaCha8Rng) -> R) -> R {
    let mut guard = SHARED.lock().unwrap_or_else(PoisonError::into_inner);
    let rng = guard.get_or_insert_with(ChaCha8Rng::from_os_rng);
    f(rng)
}

/// Replace the shared source. `Some(seed)` makes it deterministic; `None` drops it
/// so the next draw re-creates it from OS entropy.
pub fn reset_shared(seed: Option<u64>) {
    let mut guard = SHARED.lock().unwrap_or_else(PoisonError::into_inner);
    *guard = seed.map(ChaCha8Rng::seed_from_u64);
}

/// Serializes tests that reseed and draw from the shared source.
#[cfg(test)]
pub(crate) fn shared_test_guard() -> std::sync::MutexGuard<'static, ()> {
    static GUARD: Mutex<()> = Mutex::new(());
    GUARD.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to the shared source. Created lazily on first draw.
#[derive(Clone, Copy, Debug, Default)]
pub struct SharedRandom;

impl RandomSource for SharedRandom {
    fn next_int(&mut self, bound: usize) -> usize {
        with_shared(|rng| rng.next_int(bound))
    }

    fn next_float(&mut self) -> f32 {
        with_shared(|rng| rng.next_float())
    }
}

/// Replays a fixed list of draws; falls back to 0 / 0.0 when exhausted.
/// Used to force specific branches in rules.
#[cfg(test)]
#[derive(Clone, Debug, Default)]
pub struct ScriptedRandom {
    ints: Vec<usize>,
    floats: Vec<f32>,
    int_cursor: usize,
    float_cursor: usize,
}

#[cfg(test)]
impl ScriptedRandom {
    pub fn new(ints: Vec<usize>, floats: Vec<f32>) -> Self {
        Self { ints, floats, int_cursor: 0, float_cursor: 0 }
    }
}

#[cfg(test)]
impl RandomSource for ScriptedRandom {
    fn next_int(&mut self, bound: usize) -> usize {
        let v = self.ints.get(self.int_cursor).copied().unwrap_or(0);
        self.int_cursor += 1;
        if bound == 0 { 0 } else { v % bound }
    }

    fn next_float(&mut self) -> f32 {
        let v = self.floats.get(self.float_cursor).copied().unwrap_or(0.0);
        self.float_cursor += 1;
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_sources_repeat() {
        let mut a = seeded(7);
        let mut b = seeded(7);
        for _ in 0..32 {
            assert_eq!(a.next_int(100), b.next_int(100));
            assert_eq!(a.next_float().to_bits(), b.next_float().to_bits());
        }
    }

    #[test]
    fn draws_stay_in_range() {
        let mut rng = seeded(99);
        for _ in 0..1000 {
            assert!(rng.next_int(3) < 3);
            let f = rng.next_float();
            assert!((0.0..1.0).contains(&f));
            let r = rng.range_inclusive(1, 2);
            assert!(r == 1 || r == 2);
        }
        assert_eq!(rng.next_int(0), 0);
    }

    #[test]
    fn shared_source_reset_is_reproducible() {
        let _guard = shared_test_guard();
        reset_shared(Some(42));
        let first: Vec<usize> = (0..8).map(|_| SharedRandom.next_int(1000)).collect();
        reset_shared(Some(42));
        let second: Vec<usize> = (0..8).map(|_| SharedRandom.next_int(1000)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn scripted_wraps_into_bound() {
        let mut s = ScriptedRandom::new(vec![5, 1], vec![0.25]);
        assert_eq!(s.next_int(2), 1);
        assert_eq!(s.next_int(4), 1);
        assert_eq!(s.next_int(4), 0);
        assert_eq!(s.next_float(), 0.25);
        assert_eq!(s.next_float(), 0.0);
    }
}
