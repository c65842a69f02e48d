//! Fixed-width decimal key generators.
//!
//! Two independent generators feed benchmark keys: a sequential counter
//! and a bounded pseudo-random draw. Both render their value as a decimal
//! string left-padded with `'0'` to a fixed width, so lexical and numeric
//! order agree for values that fit the width.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{KvError, KvResult};

/// Default padded width of generated values
pub const PAD_WIDTH: usize = 16;

/// Default exclusive upper bound of random draws (10^16)
pub const RANDOM_BOUND: u64 = 10_000_000_000_000_000;

/// Render `value` in base 10, left-padded with zeros to `width` characters.
///
/// Values whose natural representation is already `width` or longer are
/// returned as-is, never truncated.
pub fn pad_decimal(value: u64, width: usize) -> String {
    format!("{:0>width$}", value, width = width)
}

/// Monotonic counter producing a gap-free sequence of padded strings.
///
/// Safe to share between threads: concurrent callers each observe a
/// distinct value and together observe every value exactly once. After
/// `u64::MAX` has been issued the counter is exhausted and every further
/// call fails; it never wraps.
pub struct SeqGenerator {
    start: u64,
    // None once u64::MAX has been handed out
    next: Mutex<Option<u64>>,
    width: usize,
}

impl SeqGenerator {
    /// Counter starting at `start`, padded to the default width.
    pub fn new(start: u64) -> Self {
        Self::with_width(start, PAD_WIDTH)
    }

    pub fn with_width(start: u64, width: usize) -> Self {
        Self {
            start,
            next: Mutex::new(Some(start)),
            width,
        }
    }

    /// Take the current value and advance the counter.
    pub fn next_value(&self) -> KvResult<u64> {
        let mut next = self.next.lock();
        let value = next.ok_or(KvError::SequenceExhausted { start: self.start })?;
        *next = value.checked_add(1);
        Ok(value)
    }

    /// Take the current value as a padded string.
    pub fn next_string(&self) -> KvResult<String> {
        let value = self.next_value()?;
        Ok(pad_decimal(value, self.width))
    }

    /// Value the next call will return, or `None` once exhausted.
    pub fn peek(&self) -> Option<u64> {
        *self.next.lock()
    }

    /// Rewind to the initial seed.
    pub fn reset(&self) {
        *self.next.lock() = Some(self.start);
    }
}

impl Default for SeqGenerator {
    fn default() -> Self {
        Self::new(0)
    }
}

impl std::fmt::Debug for SeqGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeqGenerator")
            .field("start", &self.start)
            .field("next", &self.peek())
            .field("width", &self.width)
            .finish()
    }
}

/// Uniform draws from `[0, bound)` rendered as padded strings.
///
/// Values are independent and may repeat.
pub struct RandomGenerator {
    rng: Mutex<StdRng>,
    bound: u64,
    width: usize,
    draws: AtomicU64,
}

impl RandomGenerator {
    /// Entropy-seeded generator. `bound` must be non-zero.
    pub fn new(bound: u64) -> KvResult<Self> {
        check_bound(bound)?;
        Ok(Self::from_rng(StdRng::from_entropy(), bound))
    }

    /// Reproducible generator: the same seed yields the same stream.
    pub fn seeded(bound: u64, seed: u64) -> KvResult<Self> {
        check_bound(bound)?;
        Ok(Self::from_rng(StdRng::seed_from_u64(seed), bound))
    }

    // Callers have checked that bound > 0.
    fn from_rng(rng: StdRng, bound: u64) -> Self {
        Self {
            rng: Mutex::new(rng),
            bound,
            width: PAD_WIDTH,
            draws: AtomicU64::new(0),
        }
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn next_value(&self) -> u64 {
        self.draws.fetch_add(1, Ordering::Relaxed);
        self.rng.lock().gen_range(0..self.bound)
    }

    pub fn next_string(&self) -> String {
        let value = self.next_value();
        pad_decimal(value, self.width)
    }

    pub fn bound(&self) -> u64 {
        self.bound
    }

    /// Number of draws taken so far.
    pub fn draws(&self) -> u64 {
        self.draws.load(Ordering::Relaxed)
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::from_rng(StdRng::from_entropy(), RANDOM_BOUND)
    }
}

fn check_bound(bound: u64) -> KvResult<()> {
    if bound == 0 {
        return Err(KvError::InvalidConfig {
            reason: "random_bound must be > 0".into(),
        });
    }
    Ok(())
}

impl std::fmt::Debug for RandomGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomGenerator")
            .field("bound", &self.bound)
            .field("width", &self.width)
            .field("draws", &self.draws())
            .finish()
    }
}
