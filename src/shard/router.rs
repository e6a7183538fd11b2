//! Shard Router
//!
//! Maps a key to its shard and to its bucket inside that shard.

use std::fmt;
use std::sync::Arc;

/// Hash function used to place keys
///
/// The only contract is determinism and a uniform spread of the 32 bits: the
/// same key must hash to the same value across process restarts, or a
/// preserved database becomes unreadable.
pub trait KeyHasher: Send + Sync {
    fn hash(&self, key: &[u8]) -> u32;
}

/// CRC32 (IEEE) key hash
#[derive(Debug, Default, Clone, Copy)]
pub struct Crc32Hasher;

impl KeyHasher for Crc32Hasher {
    fn hash(&self, key: &[u8]) -> u32 {
        crc32fast::hash(key)
    }
}

/// Where a key lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    /// Full 32-bit hash, stored in every index record
    pub key_hash: u32,
    /// `key_hash mod max_file_count`
    pub shard: u32,
    /// `key_hash mod max_slot_count`
    pub slot: u32,
}

/// Routes keys with a pluggable hasher
#[derive(Clone)]
pub struct ShardRouter {
    hasher: Arc<dyn KeyHasher>,
    file_count: u32,
    slot_count: u32,
}

impl ShardRouter {
    /// Create a router over `file_count` shards of `slot_count` buckets each
    pub fn new(hasher: Arc<dyn KeyHasher>, file_count: u32, slot_count: u32) -> Self {
        Self {
            hasher,
            file_count,
            slot_count,
        }
    }

    /// Route a key
    pub fn route(&self, key: &[u8]) -> Route {
        let key_hash = self.hasher.hash(key);
        Route {
            key_hash,
            shard: key_hash % self.file_count,
            slot: key_hash % self.slot_count,
        }
    }

    pub fn file_count(&self) -> u32 {
        self.file_count
    }

    pub fn slot_count(&self) -> u32 {
        self.slot_count
    }
}

impl fmt::Debug for ShardRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardRouter")
            .field("file_count", &self.file_count)
            .field("slot_count", &self.slot_count)
            .finish_non_exhaustive()
    }
}
