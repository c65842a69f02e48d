//! Interfaces of the backing key-value store.
//!
//! The plugin talks to two clients: a raw client with single-key, batch
//! and scan operations, and a transactional store handing out
//! transactions. A `StoreDriver` opens both from a cluster address.

use crate::error::KvResult;

/// Key-value pair as returned by scans
pub type KvPair = (Vec<u8>, Vec<u8>);

/// Raw (non-transactional) store client.
///
/// Keys are compared as unsigned bytes.
pub trait RawKvClient: Send + Sync {
    fn put(&self, key: &[u8], value: &[u8]) -> KvResult<()>;

    /// Value for `key`, `None` if absent.
    fn get(&self, key: &[u8]) -> KvResult<Option<Vec<u8>>>;

    fn delete(&self, key: &[u8]) -> KvResult<()>;

    /// Values in the same order as `keys`.
    fn batch_get(&self, keys: &[Vec<u8>]) -> KvResult<Vec<Option<Vec<u8>>>>;

    fn batch_put(&self, keys: &[Vec<u8>], values: &[Vec<u8>]) -> KvResult<()>;

    fn batch_delete(&self, keys: &[Vec<u8>]) -> KvResult<()>;

    /// Up to `limit` pairs with key >= `start`, ascending.
    fn scan(&self, start: &[u8], limit: usize) -> KvResult<Vec<KvPair>>;

    fn close(&self) -> KvResult<()>;

    fn cluster_id(&self) -> u64;
}

/// One transaction. Reads see the transaction's own writes.
///
/// Once committed or rolled back, every call fails with `TxnClosed`.
pub trait Transaction {
    /// Value for `key`; a missing key is `KvError::NotFound`.
    fn get(&self, key: &[u8]) -> KvResult<Vec<u8>>;

    fn set(&mut self, key: &[u8], value: &[u8]) -> KvResult<()>;

    fn delete(&mut self, key: &[u8]) -> KvResult<()>;

    /// Ascending pairs with key >= `start`.
    fn iter(&self, start: &[u8]) -> KvResult<Box<dyn Iterator<Item = KvResult<KvPair>> + '_>>;

    fn commit(&mut self) -> KvResult<()>;

    fn rollback(&mut self) -> KvResult<()>;
}

/// Transactional store.
pub trait TxnKvStore: Send + Sync {
    type Txn: Transaction;

    fn begin(&self) -> KvResult<Self::Txn>;
}

/// Opens store clients for a cluster address.
pub trait StoreDriver {
    type Raw: RawKvClient;
    type Txn: TxnKvStore;

    fn open_txn(&self, addr: &str) -> KvResult<Self::Txn>;

    /// `addrs` is the already split endpoint list.
    fn open_raw(&self, addrs: &[&str]) -> KvResult<Self::Raw>;
}

/// Split a `;`-separated endpoint list, dropping empty entries.
pub fn split_addrs(addrs: &str) -> Vec<&str> {
    addrs
        .split(';')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .collect()
}
