//! Placeholder expansion for command arguments.
//!
//! An argument such as `user-__seq_int__` becomes `user-0000000000000042`
//! at request time. Each marker type present in an argument costs one
//! generator draw, and every occurrence of that marker receives the same
//! value. The sequence marker is resolved before the random marker.

use crate::config::KeygenConfig;
use crate::error::{KvError, KvResult};
use crate::keygen::{RandomGenerator, SeqGenerator};

/// Replaced by the next sequential value
pub const SEQ_MARKER: &str = "__seq_int__";

/// Replaced by a random value
pub const RAND_MARKER: &str = "__rand_int__";

/// True if `arg` contains `marker`.
pub fn has_marker(arg: &str, marker: &str) -> bool {
    arg.contains(marker)
}

/// Replace every occurrence of `marker` in `arg` with `value`.
pub fn substitute(arg: &str, marker: &str, value: &str) -> String {
    arg.replace(marker, value)
}

/// Resolves placeholder markers from a pair of generators.
///
/// Expansion takes `&self`, so one `Expander` behind an `Arc` serves every
/// client in the process and they all draw from the same counter.
#[derive(Debug, Default)]
pub struct Expander {
    seq: SeqGenerator,
    random: RandomGenerator,
}

impl Expander {
    pub fn new(seq: SeqGenerator, random: RandomGenerator) -> Self {
        Self { seq, random }
    }

    /// Validate `config` and build generators from it.
    pub fn from_config(config: &KeygenConfig) -> KvResult<Self> {
        config
            .validate()
            .map_err(|reason| KvError::InvalidConfig { reason })?;
        let seq = SeqGenerator::with_width(config.seq_start, config.pad_width);
        let random = match config.seed {
            Some(seed) => RandomGenerator::seeded(config.random_bound, seed)?,
            None => RandomGenerator::new(config.random_bound)?,
        };
        Ok(Self::new(seq, random.with_width(config.pad_width)))
    }

    /// Expand one argument. Arguments without markers come back unchanged.
    ///
    /// Fails only when the sequential counter is exhausted.
    pub fn expand(&self, arg: &str) -> KvResult<String> {
        let mut out = arg.to_string();
        if has_marker(&out, SEQ_MARKER) {
            out = substitute(&out, SEQ_MARKER, &self.seq.next_string()?);
        }
        if has_marker(&out, RAND_MARKER) {
            out = substitute(&out, RAND_MARKER, &self.random.next_string());
        }
        Ok(out)
    }

    /// Expand each argument independently.
    pub fn expand_all(&self, args: &[String]) -> KvResult<Vec<String>> {
        args.iter().map(|a| self.expand(a)).collect()
    }

    pub fn seq(&self) -> &SeqGenerator {
        &self.seq
    }

    pub fn random(&self) -> &RandomGenerator {
        &self.random
    }
}
