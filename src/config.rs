//! Configuration for RingKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::binary::DEFAULT_MAX_VALUE_SIZE;
use crate::error::{Result, RingError};

/// Main configuration for a RingKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all shard files
    /// Internal structure:
    ///   {database_path}/
    ///     ├── 0, 1, ... N-1    (index files, one per shard)
    ///     └── data/            (data logs, bytes mode only)
    ///           └── 0, 1, ... N-1
    pub database_path: PathBuf,

    /// Whether existing shard files are truncated at open
    pub open_mode: OpenMode,

    /// Whether values are inline scalars or data log payloads
    pub value_mode: ValueMode,

    /// When writes are forced to disk
    pub sync_strategy: SyncStrategy,

    // -------------------------------------------------------------------------
    // Geometry (recorded in `{database_path}/meta`; a preserve-mode open
    // with different values is rejected)
    // -------------------------------------------------------------------------
    /// Number of hash buckets per shard
    pub max_slot_count: u32,

    /// Capacity of the index record ring per shard
    pub max_index_count: u32,

    /// Number of shards
    pub max_file_count: u32,

    // -------------------------------------------------------------------------
    // Limits
    // -------------------------------------------------------------------------
    /// Payloads of this many bytes or more are rejected
    pub max_value_size: usize,
}

/// How shard files are treated when the engine opens them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Truncate existing files: the store always starts empty
    Truncate,

    /// Keep existing contents and continue from the persisted cursors
    Preserve,
}

/// What the 32-bit value field of an index record holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueMode {
    /// Values are stored inline in the index record
    Scalar,

    /// Values are payloads in the per-shard data log; the record holds an offset
    Bytes,
}

/// Sync strategy: how often shard files are fsynced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync around every slot commit (safest, slowest)
    EveryWrite,

    /// Only fsync on `Engine::flush` / `Engine::close`
    OnFlush,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("./ringkv_data"),
            open_mode: OpenMode::Truncate,
            value_mode: ValueMode::Scalar,
            sync_strategy: SyncStrategy::EveryWrite,
            max_slot_count: 5_000_000,
            max_index_count: 20_000_000,
            max_file_count: 1024,
            max_value_size: DEFAULT_MAX_VALUE_SIZE,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the geometry and limits describe a usable store
    pub fn validate(&self) -> Result<()> {
        if self.max_slot_count == 0 {
            return Err(RingError::Config("max_slot_count must be > 0".to_string()));
        }
        if self.max_index_count == 0 || self.max_index_count == u32::MAX {
            return Err(RingError::Config(format!(
                "max_index_count must be in 1..{}",
                u32::MAX
            )));
        }
        if self.max_file_count == 0 {
            return Err(RingError::Config("max_file_count must be > 0".to_string()));
        }
        if self.max_value_size == 0 || self.max_value_size as u64 > u32::MAX as u64 {
            return Err(RingError::Config(format!(
                "max_value_size must be in 1..={}",
                u32::MAX
            )));
        }
        Ok(())
    }

    /// Whether shards carry a data log
    pub fn has_data_log(&self) -> bool {
        self.value_mode == ValueMode::Bytes
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the database directory (root for all shard files)
    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.database_path = path.into();
        self
    }

    /// Set the open mode
    pub fn open_mode(mut self, mode: OpenMode) -> Self {
        self.config.open_mode = mode;
        self
    }

    /// Set the value mode
    pub fn value_mode(mut self, mode: ValueMode) -> Self {
        self.config.value_mode = mode;
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the number of hash buckets per shard
    pub fn max_slot_count(mut self, count: u32) -> Self {
        self.config.max_slot_count = count;
        self
    }

    /// Set the index ring capacity per shard
    pub fn max_index_count(mut self, count: u32) -> Self {
        self.config.max_index_count = count;
        self
    }

    /// Set the number of shards
    pub fn max_file_count(mut self, count: u32) -> Self {
        self.config.max_file_count = count;
        self
    }

    /// Set the payload size limit (exclusive)
    pub fn max_value_size(mut self, size: usize) -> Self {
        self.config.max_value_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
