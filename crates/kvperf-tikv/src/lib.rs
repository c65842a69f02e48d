//! TiKV benchmark plugin
//!
//! Issues `set`, `get`, `delete` and `scan` requests against a TiKV-style
//! store, either through transactions or through the raw key-value API.
//!
//! # Architecture
//!
//! The raw API compares keys as plain bytes and has no notion of the
//! transactional key encoding. To keep raw scans meaningful:
//! - `RawClient` encodes every key with the memcomparable codec before it
//!   reaches the store
//! - keys returned by raw scans are decoded back before they are reported
//! - the transactional path passes keys through untouched
//!
//! Raw and transactional writes must not be mixed on one keyspace.

pub mod client;
pub mod command;
pub mod raw;

pub use client::{BenchClient, Client, SharedBuffer, DESCRIPTION, NAME};
pub use command::{call, Command, Connection};
pub use raw::RawClient;
