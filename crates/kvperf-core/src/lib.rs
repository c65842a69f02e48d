//! kvperf core: ordered key encoding and key generation for KV benchmarks
//!
//! The pieces a key-value load generator needs regardless of which store
//! it drives.
//!
//! # Architecture
//!
//! - **Codec**: memcomparable encoding so raw byte order matches key order
//! - **Keygen**: fixed-width sequential and random decimal values
//! - **Placeholders**: `__seq_int__` / `__rand_int__` expansion in arguments
//! - **Store**: raw and transactional client traits, plus an in-memory backend
//!
//! # No Network Dependencies
//!
//! Store clients are traits. Cluster-specific drivers live in the plugin
//! crate or outside this workspace.

pub mod codec;
pub mod config;
pub mod error;
pub mod keygen;
pub mod memstore;
pub mod placeholder;
pub mod store;

// Re-export key types for convenience
pub use codec::KeyCodec;
pub use config::{KeygenConfig, Options};
pub use error::{KvError, KvResult};
pub use keygen::{RandomGenerator, SeqGenerator};
pub use memstore::{MemDriver, MemStore, MemTxn};
pub use placeholder::{Expander, RAND_MARKER, SEQ_MARKER};
pub use store::{KvPair, RawKvClient, StoreDriver, Transaction, TxnKvStore};
