//! Memcomparable key encoding
//!
//! Raw key-value stores compare keys as unsigned bytes. Encoding every key
//! with this codec makes that byte order match the order of the original
//! keys, including when one key is a prefix of another, while remaining
//! exactly reversible.
//!
//! Layout: `[group1][marker1]...[groupN][markerN]`
//!
//! - each group is 8 bytes, zero-padded at the end of the input
//! - each marker is `0xFF - <number of padding bytes>`
//! - the last group always has a marker below `0xFF`; an input whose
//!   length is a multiple of 8 (including empty) gets an extra empty group
//!
//! ```text
//! []                       -> [0, 0, 0, 0, 0, 0, 0, 0, 247]
//! [1, 2, 3]                -> [1, 2, 3, 0, 0, 0, 0, 0, 250]
//! [1, 2, 3, 0]             -> [1, 2, 3, 0, 0, 0, 0, 0, 251]
//! [1, 2, 3, 4, 5, 6, 7, 8] -> [1, 2, 3, 4, 5, 6, 7, 8, 255, 0, 0, 0, 0, 0, 0, 0, 0, 247]
//! ```

use std::borrow::Cow;

use crate::error::{KvError, KvResult};

/// Data bytes per group
pub const GROUP_SIZE: usize = 8;

/// Encoded bytes per group (data + marker)
pub const ENCODED_GROUP_SIZE: usize = GROUP_SIZE + 1;

/// Marker of a full group with no padding
pub const MARKER: u8 = 0xFF;

/// Padding byte
pub const PAD: u8 = 0x00;

/// Length of the encoding of a `len`-byte input.
pub fn encoded_len(len: usize) -> usize {
    (len / GROUP_SIZE + 1) * ENCODED_GROUP_SIZE
}

/// Append the memcomparable encoding of `data` to `dst`.
pub fn encode_bytes(dst: &mut Vec<u8>, data: &[u8]) {
    dst.reserve(encoded_len(data.len()));

    let mut groups = data.chunks_exact(GROUP_SIZE);
    for group in &mut groups {
        dst.extend_from_slice(group);
        dst.push(MARKER);
    }

    // Terminal group: possibly empty, always padded.
    let tail = groups.remainder();
    let padding = GROUP_SIZE - tail.len();
    dst.extend_from_slice(tail);
    dst.resize(dst.len() + padding, PAD);
    dst.push(MARKER - padding as u8);
}

/// Encode `data` into a freshly allocated buffer.
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(encoded_len(data.len()));
    encode_bytes(&mut buf, data);
    buf
}

/// Decode one value from the front of `src`.
///
/// Returns the decoded value and the bytes that follow it. Malformed input
/// is reported as corruption and never partially decoded.
pub fn decode_bytes(src: &[u8]) -> KvResult<(Vec<u8>, &[u8])> {
    let mut out = Vec::with_capacity(src.len() / ENCODED_GROUP_SIZE * GROUP_SIZE);
    let mut offset = 0;

    loop {
        let rest = &src[offset..];
        if rest.len() < ENCODED_GROUP_SIZE {
            return Err(KvError::Truncated {
                offset,
                needed: ENCODED_GROUP_SIZE,
                available: rest.len(),
            });
        }

        let group = &rest[..GROUP_SIZE];
        let marker = rest[GROUP_SIZE];
        let padding = (MARKER - marker) as usize;

        if padding == 0 {
            out.extend_from_slice(group);
            offset += ENCODED_GROUP_SIZE;
            continue;
        }

        if padding > GROUP_SIZE {
            return Err(KvError::InvalidMarker {
                offset: offset + GROUP_SIZE,
                marker,
            });
        }

        let real = GROUP_SIZE - padding;
        if group[real..].iter().any(|&b| b != PAD) {
            return Err(KvError::NonZeroPadding { offset, padding });
        }

        out.extend_from_slice(&group[..real]);
        return Ok((out, &rest[ENCODED_GROUP_SIZE..]));
    }
}

/// Key transformation applied by a raw client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyCodec {
    /// Keys pass through unchanged; range scans cannot be decoded.
    #[default]
    Identity,
    /// Keys are memcomparable-encoded; byte order matches key order.
    Memcomparable,
}

impl KeyCodec {
    pub fn encode<'a>(&self, key: &'a [u8]) -> Cow<'a, [u8]> {
        match self {
            KeyCodec::Identity => Cow::Borrowed(key),
            KeyCodec::Memcomparable => Cow::Owned(encode(key)),
        }
    }

    /// Decode one key. Identity consumes the whole buffer.
    pub fn decode<'a>(&self, buf: &'a [u8]) -> KvResult<(Vec<u8>, &'a [u8])> {
        match self {
            KeyCodec::Identity => Ok((buf.to_vec(), &buf[buf.len()..])),
            KeyCodec::Memcomparable => decode_bytes(buf),
        }
    }

    pub fn encode_all(&self, keys: &[Vec<u8>]) -> Vec<Vec<u8>> {
        keys.iter().map(|k| self.encode(k).into_owned()).collect()
    }

    pub fn is_order_preserving(&self) -> bool {
        matches!(self, KeyCodec::Memcomparable)
    }
}
