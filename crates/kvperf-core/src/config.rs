//! Configuration for kvperf
//!
//! `Options` carries the plugin flags; `KeygenConfig` controls the key
//! generators behind the placeholder markers.

use crate::keygen::{PAD_WIDTH, RANDOM_BOUND};

/// Widest padding that still makes sense for a u64 (20 digits).
const MAX_PAD_WIDTH: usize = 20;

/// Plugin flags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// Use the raw client instead of transactions. Raw and transactional
    /// writes must not be mixed on one keyspace.
    pub raw: bool,
    /// Write results to stdout instead of discarding them
    pub verbose: bool,
    /// Scan limit; passed verbatim on the raw path, 0 means unbounded on the txn path
    pub limit: usize,
}

impl Options {
    /// Raw-mode options with the given scan limit.
    pub fn raw(limit: usize) -> Self {
        Self { raw: true, verbose: false, limit }
    }

    /// Transactional options with the given scan limit.
    pub fn txn(limit: usize) -> Self {
        Self { raw: false, verbose: false, limit }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Key generator settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeygenConfig {
    /// Padded width of generated values
    pub pad_width: usize,
    /// Exclusive upper bound of random draws
    pub random_bound: u64,
    /// First value of the sequential counter
    pub seq_start: u64,
    /// Seed for the random stream; entropy when unset
    pub seed: Option<u64>,
}

impl KeygenConfig {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.pad_width == 0 || self.pad_width > MAX_PAD_WIDTH {
            return Err(format!("pad_width must be in [1, {}]", MAX_PAD_WIDTH));
        }
        if self.random_bound == 0 {
            return Err("random_bound must be > 0".into());
        }
        Ok(())
    }
}

impl Default for KeygenConfig {
    fn default() -> Self {
        Self {
            pad_width: PAD_WIDTH,
            random_bound: RANDOM_BOUND,
            seq_start: 0,
            seed: None,
        }
    }
}
