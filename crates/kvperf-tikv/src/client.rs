//! Benchmark client: the unit the load harness drives.
//!
//! The harness creates one `Client` from the parsed flags and command
//! words, dials it once, then calls `request()` in a loop. Every request
//! expands the placeholder markers afresh, so `set key-__seq_int__ v`
//! writes a new key each time. Clients that run side by side should share
//! one `Expander` (see `Client::with_expander`) so the sequential counter
//! is process-wide and no two requests write the same key.

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use kvperf_core::store::split_addrs;
use kvperf_core::{Expander, KeyCodec, KeygenConfig, KvError, KvResult, Options, StoreDriver};

use crate::command::{call, Connection};
use crate::raw::RawClient;

/// Name the plugin registers under
pub const NAME: &str = "tikv";

/// One-line description shown by the harness
pub const DESCRIPTION: &str = "tikv performance benchmark";

/// What a load harness needs from a benchmark plugin.
pub trait BenchClient {
    /// Connect to the cluster at `addr`.
    fn dial(&mut self, addr: &str) -> KvResult<()>;

    /// Issue one request.
    fn request(&mut self) -> KvResult<()>;
}

/// TiKV benchmark client over any store driver.
pub struct Client<D: StoreDriver> {
    driver: D,
    options: Options,
    args: Vec<String>,
    expander: Arc<Expander>,
    out: Box<dyn Write + Send>,
    conn: Option<Connection<D::Raw, D::Txn>>,
}

impl<D: StoreDriver> Client<D> {
    /// Create a client for the command words in `args`.
    ///
    /// `args` must hold at least the command name; everything else is
    /// checked per request.
    pub fn new(driver: D, options: Options, args: Vec<String>) -> KvResult<Self> {
        if args.is_empty() {
            return Err(KvError::MissingCommand);
        }

        let out: Box<dyn Write + Send> = if options.verbose {
            Box::new(io::stdout())
        } else {
            Box::new(io::sink())
        };

        Ok(Self {
            driver,
            options,
            args,
            expander: Arc::new(Expander::default()),
            out,
            conn: None,
        })
    }

    /// Give this client generators of its own, built from `config`.
    pub fn with_keygen(mut self, config: &KeygenConfig) -> KvResult<Self> {
        self.expander = Arc::new(Expander::from_config(config)?);
        Ok(self)
    }

    /// Draw placeholder values from `expander`, typically one shared by
    /// every client in the process.
    pub fn with_expander(mut self, expander: Arc<Expander>) -> Self {
        self.expander = expander;
        self
    }

    /// Send results to `out` regardless of the verbose flag.
    pub fn with_output(mut self, out: Box<dyn Write + Send>) -> Self {
        self.out = out;
        self
    }

    /// Open the transactional store and the raw client.
    ///
    /// The raw client gets the memcomparable codec so raw scans come back
    /// in key order.
    pub fn dial(&mut self, addr: &str) -> KvResult<()> {
        let txn = self.driver.open_txn(addr)?;
        let raw = self.driver.open_raw(&split_addrs(addr))?;
        let raw = RawClient::new(raw).with_codec(KeyCodec::Memcomparable);

        info!(addr, cluster_id = raw.cluster_id(), raw_mode = self.options.raw, "dialed store");
        self.conn = Some(Connection { raw, txn });
        Ok(())
    }

    /// Expand placeholders in every argument and run the command.
    pub fn request(&mut self) -> KvResult<()> {
        let conn = self.conn.as_ref().ok_or(KvError::NotConnected)?;
        let args = self.expander.expand_all(&self.args)?;
        call(conn, &self.options, self.out.as_mut(), &args)
    }

    /// Close the raw client.
    pub fn close(&mut self) -> KvResult<()> {
        match self.conn.take() {
            Some(conn) => conn.raw.close(),
            None => Ok(()),
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn expander(&self) -> &Arc<Expander> {
        &self.expander
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }
}

impl<D: StoreDriver> BenchClient for Client<D> {
    fn dial(&mut self, addr: &str) -> KvResult<()> {
        Client::dial(self, addr)
    }

    fn request(&mut self) -> KvResult<()> {
        Client::request(self)
    }
}

impl<D: StoreDriver> std::fmt::Debug for Client<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("options", &self.options)
            .field("args", &self.args)
            .field("connected", &self.conn.is_some())
            .finish()
    }
}

/// Cloneable in-memory output sink, for capturing results.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock()).into_owned()
    }

    /// Output lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn clear(&self) {
        self.buf.lock().clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvperf_core::{MemDriver, MemStore, SeqGenerator};

    fn client_on(
        store: &MemStore,
        options: Options,
        words: &[&str],
    ) -> (Client<MemDriver>, SharedBuffer) {
        let buf = SharedBuffer::new();
        let args = words.iter().map(|w| w.to_string()).collect();
        let client = Client::new(MemDriver::new(store.clone()), options, args)
            .unwrap()
            .with_output(Box::new(buf.clone()));
        (client, buf)
    }

    fn client(options: Options, words: &[&str]) -> (Client<MemDriver>, MemStore, SharedBuffer) {
        let store = MemStore::new();
        let (client, buf) = client_on(&store, options, words);
        (client, store, buf)
    }

    #[test]
    fn test_new_requires_command() {
        let err = Client::new(MemDriver::default(), Options::default(), vec![]).unwrap_err();
        assert_eq!(err, KvError::MissingCommand);
    }

    #[test]
    fn test_request_before_dial() {
        let (mut c, _store, _buf) = client(Options::txn(0), &["get", "k"]);
        assert_eq!(c.request(), Err(KvError::NotConnected));
    }

    #[test]
    fn test_dial_rejects_empty_addr() {
        let (mut c, _store, _buf) = client(Options::txn(0), &["get", "k"]);
        assert!(matches!(c.dial(""), Err(KvError::InvalidConfig { .. })));
        assert!(!c.is_connected());
    }

    #[test]
    fn test_sequential_requests_write_distinct_keys() {
        let (mut c, store, _buf) = client(Options::txn(0), &["set", "key-__seq_int__", "v"]);
        c.dial("pd:2379").unwrap();
        for _ in 0..3 {
            c.request().unwrap();
        }
        assert_eq!(
            store.keys(),
            vec![
                b"key-0000000000000000".to_vec(),
                b"key-0000000000000001".to_vec(),
                b"key-0000000000000002".to_vec(),
            ]
        );
        // Stored arguments are never rewritten
        assert_eq!(c.args()[1], "key-__seq_int__");
    }

    #[test]
    fn test_raw_requests_use_codec() {
        let (mut c, store, buf) = client(Options::raw(0), &["set", "k", "v"]);
        c.dial("pd1:2379;pd2:2379").unwrap();
        c.request().unwrap();
        assert_eq!(store.raw_entry(&kvperf_core::codec::encode(b"k")), Some(b"v".to_vec()));
        assert_eq!(buf.contents(), "");
    }

    #[test]
    fn test_keygen_config_applied() {
        let (c, _store, _buf) = client(Options::txn(0), &["get", "__seq_int__"]);
        let config = KeygenConfig { pad_width: 4, random_bound: 10, seq_start: 7, seed: Some(1) };
        let c = c.with_keygen(&config).unwrap();
        assert_eq!(c.expander().expand("__seq_int__").unwrap(), "0007");

        let bad = KeygenConfig { random_bound: 0, ..KeygenConfig::default() };
        let (c, _store, _buf) = client(Options::txn(0), &["get", "k"]);
        assert!(matches!(c.with_keygen(&bad), Err(KvError::InvalidConfig { .. })));
    }

    #[test]
    fn test_clients_sharing_expander_write_distinct_keys() {
        let store = MemStore::new();
        let shared = Arc::new(Expander::default());
        let words = ["set", "key-__seq_int__", "v"];
        let (a, _) = client_on(&store, Options::txn(0), &words);
        let (b, _) = client_on(&store, Options::txn(0), &words);
        let mut a = a.with_expander(Arc::clone(&shared));
        let mut b = b.with_expander(Arc::clone(&shared));
        a.dial("pd:2379").unwrap();
        b.dial("pd:2379").unwrap();

        a.request().unwrap();
        b.request().unwrap();
        a.request().unwrap();

        assert_eq!(
            store.keys(),
            vec![
                b"key-0000000000000000".to_vec(),
                b"key-0000000000000001".to_vec(),
                b"key-0000000000000002".to_vec(),
            ]
        );
        assert_eq!(shared.seq().peek(), Some(3));
    }

    #[test]
    fn test_exhausted_counter_fails_request() {
        let expander = Expander::new(SeqGenerator::new(u64::MAX), Default::default());
        let (c, store, _buf) = client(Options::txn(0), &["set", "k-__seq_int__", "v"]);
        let mut c = c.with_expander(Arc::new(expander));
        c.dial("pd:2379").unwrap();

        c.request().unwrap();
        assert_eq!(c.request(), Err(KvError::SequenceExhausted { start: u64::MAX }));
        assert_eq!(store.len(), 1);
        assert_eq!(store.commits(), 1);
    }

    #[test]
    fn test_close_disconnects() {
        let (mut c, store, _buf) = client(Options::raw(0), &["get", "k"]);
        c.dial("pd:2379").unwrap();
        c.close().unwrap();
        assert!(store.is_closed());
        assert_eq!(c.request(), Err(KvError::NotConnected));
        c.close().unwrap();
    }

    #[test]
    fn test_shared_buffer() {
        let mut buf = SharedBuffer::new();
        writeln!(buf, "one").unwrap();
        writeln!(buf, "two").unwrap();
        assert_eq!(buf.lines(), vec!["one", "two"]);
        buf.clear();
        assert_eq!(buf.contents(), "");
    }
}
