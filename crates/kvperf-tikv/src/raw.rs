//! Raw client adapter: applies a key codec around a raw store client.
//!
//! Keys are encoded on the way in. Scans decode the returned keys on the
//! way out, so callers only ever see their own keys. Values are never
//! touched.

use kvperf_core::{KeyCodec, KvError, KvPair, KvResult, RawKvClient};

/// Raw store client with key encoding.
///
/// Built with the identity codec; `with_codec(KeyCodec::Memcomparable)`
/// makes the store's byte order match key order and enables `scan`.
pub struct RawClient<C: RawKvClient> {
    raw: C,
    codec: KeyCodec,
}

impl<C: RawKvClient> RawClient<C> {
    pub fn new(raw: C) -> Self {
        Self {
            raw,
            codec: KeyCodec::Identity,
        }
    }

    /// Set the codec used to encode and decode keys.
    pub fn with_codec(mut self, codec: KeyCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn codec(&self) -> KeyCodec {
        self.codec
    }

    /// Underlying client, for inspection.
    pub fn inner(&self) -> &C {
        &self.raw
    }

    pub fn put(&self, key: &[u8], value: &[u8]) -> KvResult<()> {
        self.raw.put(&self.codec.encode(key), value)
    }

    pub fn get(&self, key: &[u8]) -> KvResult<Option<Vec<u8>>> {
        self.raw.get(&self.codec.encode(key))
    }

    pub fn delete(&self, key: &[u8]) -> KvResult<()> {
        self.raw.delete(&self.codec.encode(key))
    }

    /// Values in the same order as `keys`.
    pub fn batch_get(&self, keys: &[Vec<u8>]) -> KvResult<Vec<Option<Vec<u8>>>> {
        match self.codec {
            KeyCodec::Identity => self.raw.batch_get(keys),
            codec => self.raw.batch_get(&codec.encode_all(keys)),
        }
    }

    pub fn batch_put(&self, keys: &[Vec<u8>], values: &[Vec<u8>]) -> KvResult<()> {
        match self.codec {
            KeyCodec::Identity => self.raw.batch_put(keys, values),
            codec => self.raw.batch_put(&codec.encode_all(keys), values),
        }
    }

    pub fn batch_delete(&self, keys: &[Vec<u8>]) -> KvResult<()> {
        match self.codec {
            KeyCodec::Identity => self.raw.batch_delete(keys),
            codec => self.raw.batch_delete(&codec.encode_all(keys)),
        }
    }

    /// Up to `limit` pairs starting at `start_key`, in key order.
    ///
    /// Requires an order-preserving codec. To exclude `start_key`, append a
    /// zero byte to it. A returned key that fails to decode fails the whole
    /// scan.
    pub fn scan(&self, start_key: &[u8], limit: usize) -> KvResult<Vec<KvPair>> {
        if !self.codec.is_order_preserving() {
            return Err(KvError::ScanRequiresCodec);
        }

        let pairs = self.raw.scan(&self.codec.encode(start_key), limit)?;
        pairs
            .into_iter()
            .map(|(key, value)| {
                let (key, _) = self.codec.decode(&key)?;
                Ok((key, value))
            })
            .collect()
    }

    pub fn close(&self) -> KvResult<()> {
        self.raw.close()
    }

    pub fn cluster_id(&self) -> u64 {
        self.raw.cluster_id()
    }
}

impl<C: RawKvClient> std::fmt::Debug for RawClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawClient")
            .field("codec", &self.codec)
            .field("cluster_id", &self.raw.cluster_id())
            .finish()
    }
}
