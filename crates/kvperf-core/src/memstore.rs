//! In-memory reference backend.
//!
//! `MemStore` implements both the raw and the transactional store
//! interfaces over one RAM hash table, so the plugin can run without a
//! cluster and tests can observe exactly what reached the store.
//!
//! **Raw path**: direct reads and writes under the RwLock
//! **Txn path**: writes buffered per transaction, applied on commit
//! **Scans**: sorted snapshot of the matching keys, O(n log n) per call

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::error::{KvError, KvResult};
use crate::store::{KvPair, RawKvClient, StoreDriver, Transaction, TxnKvStore};

struct Inner {
    /// RAM working set
    data: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
    closed: AtomicBool,
    cluster_id: u64,
    /// Committed transactions since creation
    commits: AtomicU64,
}

/// Shared in-memory store. Clones share the same data.
#[derive(Clone)]
pub struct MemStore {
    inner: Arc<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::with_cluster_id(1)
    }

    pub fn with_cluster_id(cluster_id: u64) -> Self {
        Self {
            inner: Arc::new(Inner {
                data: RwLock::new(HashMap::new()),
                closed: AtomicBool::new(false),
                cluster_id,
                commits: AtomicU64::new(0),
            }),
        }
    }

    fn check_open(&self) -> KvResult<()> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(KvError::StoreClosed);
        }
        Ok(())
    }

    /// Number of stored pairs.
    pub fn len(&self) -> usize {
        self.inner.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.data.read().is_empty()
    }

    /// Stored bytes for `key`, bypassing any codec.
    pub fn raw_entry(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.data.read().get(key).cloned()
    }

    /// All stored keys in byte order.
    pub fn keys(&self) -> Vec<Vec<u8>> {
        let data = self.inner.data.read();
        let mut keys: Vec<Vec<u8>> = data.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn commits(&self) -> u64 {
        self.inner.commits.load(Ordering::Relaxed)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Sorted snapshot of every pair with key >= `start`.
    fn snapshot_from(&self, start: &[u8]) -> BTreeMap<Vec<u8>, Vec<u8>> {
        let data = self.inner.data.read();
        data.iter()
            .filter(|(k, _)| k.as_slice() >= start)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemStore")
            .field("cluster_id", &self.inner.cluster_id)
            .field("entries", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl RawKvClient for MemStore {
    fn put(&self, key: &[u8], value: &[u8]) -> KvResult<()> {
        self.check_open()?;
        self.inner.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &[u8]) -> KvResult<Option<Vec<u8>>> {
        self.check_open()?;
        Ok(self.inner.data.read().get(key).cloned())
    }

    fn delete(&self, key: &[u8]) -> KvResult<()> {
        self.check_open()?;
        self.inner.data.write().remove(key);
        Ok(())
    }

    fn batch_get(&self, keys: &[Vec<u8>]) -> KvResult<Vec<Option<Vec<u8>>>> {
        self.check_open()?;
        let data = self.inner.data.read();
        Ok(keys.iter().map(|k| data.get(k).cloned()).collect())
    }

    fn batch_put(&self, keys: &[Vec<u8>], values: &[Vec<u8>]) -> KvResult<()> {
        self.check_open()?;
        if keys.len() != values.len() {
            return Err(KvError::BatchLengthMismatch {
                keys: keys.len(),
                values: values.len(),
            });
        }
        let mut data = self.inner.data.write();
        for (k, v) in keys.iter().zip(values) {
            data.insert(k.clone(), v.clone());
        }
        Ok(())
    }

    fn batch_delete(&self, keys: &[Vec<u8>]) -> KvResult<()> {
        self.check_open()?;
        let mut data = self.inner.data.write();
        for k in keys {
            data.remove(k);
        }
        Ok(())
    }

    fn scan(&self, start: &[u8], limit: usize) -> KvResult<Vec<KvPair>> {
        self.check_open()?;
        Ok(self.snapshot_from(start).into_iter().take(limit).collect())
    }

    /// Closing any handle closes the shared store.
    fn close(&self) -> KvResult<()> {
        self.inner.closed.store(true, Ordering::Release);
        Ok(())
    }

    fn cluster_id(&self) -> u64 {
        self.inner.cluster_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxnState {
    Active,
    Committed,
    RolledBack,
}

/// Transaction over a `MemStore`.
///
/// Writes are buffered (`None` marks a delete) and applied atomically
/// under the store's write lock on commit.
pub struct MemTxn {
    store: MemStore,
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    state: TxnState,
}

impl MemTxn {
    fn check_active(&self) -> KvResult<()> {
        self.store.check_open()?;
        if self.state != TxnState::Active {
            return Err(KvError::TxnClosed);
        }
        Ok(())
    }

    /// Buffered writes not yet committed.
    pub fn pending(&self) -> usize {
        self.writes.len()
    }
}

impl std::fmt::Debug for MemTxn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemTxn")
            .field("pending", &self.writes.len())
            .field("state", &self.state)
            .finish()
    }
}

impl Transaction for MemTxn {
    fn get(&self, key: &[u8]) -> KvResult<Vec<u8>> {
        self.check_active()?;
        let found = match self.writes.get(key) {
            Some(buffered) => buffered.clone(),
            None => self.store.inner.data.read().get(key).cloned(),
        };
        found.ok_or_else(|| KvError::NotFound { key: key.to_vec() })
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> KvResult<()> {
        self.check_active()?;
        self.writes.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> KvResult<()> {
        self.check_active()?;
        self.writes.insert(key.to_vec(), None);
        Ok(())
    }

    fn iter(&self, start: &[u8]) -> KvResult<Box<dyn Iterator<Item = KvResult<KvPair>> + '_>> {
        self.check_active()?;
        let mut view = self.store.snapshot_from(start);
        for (k, v) in self.writes.range(start.to_vec()..) {
            match v {
                Some(v) => {
                    view.insert(k.clone(), v.clone());
                }
                None => {
                    view.remove(k);
                }
            }
        }
        Ok(Box::new(view.into_iter().map(Ok)))
    }

    fn commit(&mut self) -> KvResult<()> {
        self.check_active()?;
        let writes = std::mem::take(&mut self.writes);
        {
            let mut data = self.store.inner.data.write();
            for (k, v) in writes {
                match v {
                    Some(v) => {
                        data.insert(k, v);
                    }
                    None => {
                        data.remove(&k);
                    }
                }
            }
        }
        self.state = TxnState::Committed;
        self.store.inner.commits.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn rollback(&mut self) -> KvResult<()> {
        if self.state != TxnState::Active {
            return Err(KvError::TxnClosed);
        }
        self.writes.clear();
        self.state = TxnState::RolledBack;
        Ok(())
    }
}

impl TxnKvStore for MemStore {
    type Txn = MemTxn;

    fn begin(&self) -> KvResult<MemTxn> {
        self.check_open()?;
        Ok(MemTxn {
            store: self.clone(),
            writes: BTreeMap::new(),
            state: TxnState::Active,
        })
    }
}

/// Driver handing out handles to one shared `MemStore`.
#[derive(Debug, Clone, Default)]
pub struct MemDriver {
    store: MemStore,
}

impl MemDriver {
    pub fn new(store: MemStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &MemStore {
        &self.store
    }
}

impl StoreDriver for MemDriver {
    type Raw = MemStore;
    type Txn = MemStore;

    fn open_txn(&self, addr: &str) -> KvResult<MemStore> {
        if addr.trim().is_empty() {
            return Err(KvError::InvalidConfig { reason: "empty store address".into() });
        }
        Ok(self.store.clone())
    }

    fn open_raw(&self, addrs: &[&str]) -> KvResult<MemStore> {
        if addrs.is_empty() {
            return Err(KvError::InvalidConfig { reason: "no raw endpoints".into() });
        }
        Ok(self.store.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_open_empty() {
        let store = MemStore::new();
        assert!(store.is_empty());
        assert_eq!(store.cluster_id(), 1);
        assert_eq!(MemStore::with_cluster_id(7).cluster_id(), 7);
    }

    #[test]
    fn test_raw_put_get_delete() {
        let store = MemStore::new();
        store.put(b"hello", b"world").unwrap();
        assert_eq!(store.get(b"hello").unwrap(), Some(b"world".to_vec()));
        store.put(b"hello", b"again").unwrap();
        assert_eq!(store.get(b"hello").unwrap(), Some(b"again".to_vec()));
        store.delete(b"hello").unwrap();
        assert_eq!(store.get(b"hello").unwrap(), None);
    }

    #[test]
    fn test_raw_batches() {
        let store = MemStore::new();
        let keys = vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()];
        let vals = vec![b"1".to_vec(), b"2".to_vec(), b"3".to_vec()];
        store.batch_put(&keys, &vals).unwrap();

        let got = store.batch_get(&[b"c".to_vec(), b"x".to_vec(), b"a".to_vec()]).unwrap();
        assert_eq!(got, vec![Some(b"3".to_vec()), None, Some(b"1".to_vec())]);

        store.batch_delete(&keys[..2]).unwrap();
        assert_eq!(store.keys(), vec![b"c".to_vec()]);

        let err = store.batch_put(&keys, &vals[..1]).unwrap_err();
        assert_eq!(err, KvError::BatchLengthMismatch { keys: 3, values: 1 });
    }

    #[test]
    fn test_raw_scan_sorted_and_limited() {
        let store = MemStore::new();
        for k in [&b"d"[..], b"a", b"c", b"b"] {
            store.put(k, k).unwrap();
        }
        let all = store.scan(b"b", 10).unwrap();
        let keys: Vec<_> = all.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec![b"b".to_vec(), b"c".to_vec(), b"d".to_vec()]);

        assert_eq!(store.scan(b"", 2).unwrap().len(), 2);
        assert!(store.scan(b"", 0).unwrap().is_empty());
    }

    #[test]
    fn test_close_rejects_calls() {
        let store = MemStore::new();
        let handle = store.clone();
        handle.close().unwrap();
        assert_eq!(store.put(b"k", b"v"), Err(KvError::StoreClosed));
        assert!(matches!(store.begin(), Err(KvError::StoreClosed)));
    }

    #[test]
    fn test_txn_commit_applies() {
        let store = MemStore::new();
        let mut txn = store.begin().unwrap();
        txn.set(b"k1", b"v1").unwrap();
        assert_eq!(txn.get(b"k1").unwrap(), b"v1");
        assert_eq!(store.get(b"k1").unwrap(), None);

        txn.commit().unwrap();
        assert_eq!(store.get(b"k1").unwrap(), Some(b"v1".to_vec()));
        assert_eq!(store.commits(), 1);
    }

    #[test]
    fn test_txn_rollback_discards() {
        let store = MemStore::new();
        let mut txn = store.begin().unwrap();
        txn.set(b"k", b"v").unwrap();
        txn.rollback().unwrap();
        assert!(store.is_empty());
        assert_eq!(txn.set(b"k", b"v"), Err(KvError::TxnClosed));
    }

    #[test]
    fn test_rollback_after_commit_fails() {
        let store = MemStore::new();
        let mut txn = store.begin().unwrap();
        txn.set(b"k", b"v").unwrap();
        txn.commit().unwrap();
        assert_eq!(txn.rollback(), Err(KvError::TxnClosed));
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn test_txn_get_missing_is_not_found() {
        let store = MemStore::new();
        let txn = store.begin().unwrap();
        assert_eq!(txn.get(b"nope"), Err(KvError::NotFound { key: b"nope".to_vec() }));
    }

    #[test]
    fn test_txn_delete_and_iter_merge() {
        let store = MemStore::new();
        store.put(b"a", b"1").unwrap();
        store.put(b"b", b"2").unwrap();
        store.put(b"c", b"3").unwrap();

        let mut txn = store.begin().unwrap();
        txn.delete(b"b").unwrap();
        txn.set(b"bb", b"new").unwrap();
        assert!(matches!(txn.get(b"b"), Err(KvError::NotFound { .. })));

        let seen: Vec<KvPair> = txn.iter(b"b").unwrap().collect::<KvResult<_>>().unwrap();
        assert_eq!(
            seen,
            vec![(b"bb".to_vec(), b"new".to_vec()), (b"c".to_vec(), b"3".to_vec())]
        );
        assert_eq!(txn.pending(), 2);

        txn.commit().unwrap();
        assert_eq!(store.keys(), vec![b"a".to_vec(), b"bb".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn test_driver_validates_addrs() {
        let driver = MemDriver::default();
        assert!(driver.open_txn("127.0.0.1:2379").is_ok());
        assert!(matches!(driver.open_txn(" "), Err(KvError::InvalidConfig { .. })));
        assert!(matches!(driver.open_raw(&[]), Err(KvError::InvalidConfig { .. })));

        let raw = driver.open_raw(&["pd:2379"]).unwrap();
        raw.put(b"shared", b"yes").unwrap();
        assert_eq!(driver.store().raw_entry(b"shared"), Some(b"yes".to_vec()));
    }

    #[test]
    fn test_concurrent_raw_writes() {
        let store = MemStore::new();
        let mut handles = vec![];
        for t in 0..8 {
            let s = store.clone();
            handles.push(thread::spawn(move || {
                for i in 0..100 {
                    s.put(format!("t{}-k{:03}", t, i).as_bytes(), b"v").unwrap();
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.len(), 800);
    }
}
