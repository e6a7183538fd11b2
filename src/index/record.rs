//! Index records
//!
//! The fixed 16-byte chain node and the query result built from it.

use crate::binary::EMPTY_U32;

/// Size of one index record
pub const INDEX_RECORD_SIZE: u64 = 16;

/// What a record's value field means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordValue {
    /// Inline scalar
    Scalar(u32),
    /// Byte offset of a payload in the shard's data log
    Offset(u32),
}

impl RecordValue {
    /// The raw 32 bits stored on disk
    pub fn raw(&self) -> u32 {
        match *self {
            RecordValue::Scalar(v) | RecordValue::Offset(v) => v,
        }
    }
}

/// One node of a bucket chain
///
/// ```text
/// ┌────────────┬───────────┬───────────────┬───────────────┐
/// │ KeyHash(4) │ Value (4) │ TimeDelta (4) │ PrevIndex (4) │
/// └────────────┴───────────┴───────────────┴───────────────┘
/// ```
/// `PrevIndex = 0xFFFFFFFF` encodes "no predecessor".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRecord {
    pub key_hash: u32,
    pub value: u32,
    pub time_delta: u32,
    pub prev: Option<u32>,
}

impl IndexRecord {
    /// Encode to the on-disk layout
    pub fn encode(&self) -> [u8; INDEX_RECORD_SIZE as usize] {
        let mut buf = [0u8; INDEX_RECORD_SIZE as usize];
        buf[0..4].copy_from_slice(&self.key_hash.to_le_bytes());
        buf[4..8].copy_from_slice(&self.value.to_le_bytes());
        buf[8..12].copy_from_slice(&self.time_delta.to_le_bytes());
        buf[12..16].copy_from_slice(&self.prev.unwrap_or(EMPTY_U32).to_le_bytes());
        buf
    }

    /// Decode from the on-disk layout
    pub fn decode(buf: &[u8; INDEX_RECORD_SIZE as usize]) -> Self {
        let word = |i: usize| u32::from_le_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]);
        let prev = word(12);
        Self {
            key_hash: word(0),
            value: word(4),
            time_delta: word(8),
            prev: (prev != EMPTY_U32).then_some(prev),
        }
    }
}

/// A record matched by a key lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIndex {
    /// The key that was looked up
    pub key: String,
    /// Scalar or data log offset, depending on the store's value mode
    pub value: RecordValue,
    /// Seconds between the shard's first write and this record's write
    pub time_elapsed: u32,
    /// Ring position of the older record this one links to
    pub chain_prev: Option<u32>,
}
