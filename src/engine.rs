//! Engine Module
//!
//! The top-level store that owns every shard and routes each operation.
//!
//! ## Responsibilities
//! - Create the database directory and open all shard files
//! - Route keys to shards and buckets
//! - Reject empty keys and oversized payloads without touching disk
//! - Enforce the value mode (inline scalars vs data log payloads)

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::config::{Config, OpenMode, ValueMode};
use crate::error::{Result, RingError};
use crate::index::{FileIndex, RecordValue};
use crate::meta::StoreMeta;
use crate::shard::{Crc32Hasher, KeyHasher, Route, Shard, ShardHeader, ShardRouter};

/// The main storage engine
///
/// ## Concurrency Model: one writer per shard
///
/// - Every shard sits behind its own `Mutex`; holding it is the exclusive
///   right to read or move that shard's cursors.
/// - Operations on different shards run in parallel, operations on the same
///   shard serialize.
/// - All methods take `&self`, so an `Engine` can be shared via `Arc`.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Key → (shard, slot)
    router: ShardRouter,

    /// Open shards, indexed by shard id
    shards: Vec<Mutex<Shard>>,
}

impl Engine {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const DATA_DIR: &'static str = "data";
    const META_FILE: &'static str = "meta";

    /// Open an engine with the default CRC32 key hash
    pub fn open(config: Config) -> Result<Self> {
        Self::open_with_hasher(config, Arc::new(Crc32Hasher))
    }

    /// Open an engine with a custom key hash
    ///
    /// On startup:
    /// 1. Validate the configuration
    /// 2. Create the database directory; in preserve mode, check the
    ///    geometry against the recorded metadata
    /// 3. Create `data/` in bytes mode and record the geometry
    /// 4. Open one index file (+ data log) per shard, truncating them unless
    ///    the open mode preserves contents
    pub fn open_with_hasher(config: Config, hasher: Arc<dyn KeyHasher>) -> Result<Self> {
        // Step 1: Reject unusable geometry
        config.validate()?;
        if (config.max_index_count as u64) < 4 * config.max_slot_count as u64 {
            warn!(
                slots = config.max_slot_count,
                records = config.max_index_count,
                "index ring is smaller than 4x the slot count; per-key history will be short"
            );
        }

        // Step 2: Geometry must match what the files were written with
        create_dir(&config.database_path)?;
        let meta_path = config.database_path.join(Self::META_FILE);
        let meta = StoreMeta::from_config(&config);
        if config.open_mode == OpenMode::Preserve {
            if let Some(recorded) = StoreMeta::load(&meta_path)? {
                recorded.check_compatible(&meta)?;
            }
        }

        // Step 3: Create the data directory and record the geometry
        let data_dir = config.database_path.join(Self::DATA_DIR);
        if config.has_data_log() {
            create_dir(&data_dir)?;
        }
        meta.store(&meta_path)?;

        // Step 4: Open shards
        let mut shards = Vec::with_capacity(config.max_file_count as usize);
        for id in 0..config.max_file_count {
            let index_path = Self::shard_path(&config.database_path, id);
            let data_path = config
                .has_data_log()
                .then(|| Self::shard_path(&data_dir, id));
            let shard = Shard::open(id, &index_path, data_path.as_deref(), &config)?;
            shards.push(Mutex::new(shard));
        }

        info!(
            path = %config.database_path.display(),
            shards = shards.len(),
            slots = config.max_slot_count,
            records = config.max_index_count,
            mode = ?config.value_mode,
            "loaded shard files"
        );

        let router = ShardRouter::new(hasher, config.max_file_count, config.max_slot_count);
        Ok(Self {
            config,
            router,
            shards,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified database directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let mut config = Config::default();
        config.database_path = path.to_path_buf();
        Self::open(config)
    }

    // =========================================================================
    // Scalar Mode
    // =========================================================================

    /// Append a scalar value to a key's history
    ///
    /// An empty key is ignored.
    pub fn put(&self, key: &str, value: u32) -> Result<()> {
        self.require_mode(ValueMode::Scalar, "put")?;
        if key.is_empty() {
            trace!("put ignored: empty key");
            return Ok(());
        }

        let route = self.route(key);
        self.shard(route.shard)?.lock().put_scalar(route, value)
    }

    /// All retained scalar values of a key, newest first
    pub fn get(&self, key: &str) -> Result<Vec<u32>> {
        self.require_mode(ValueMode::Scalar, "get")?;
        if key.is_empty() {
            return Ok(Vec::new());
        }

        let route = self.route(key);
        let shard = self.shard(route.shard)?.lock();
        let values = shard
            .chain(route)?
            .map(|entry| entry.map(|e| e.record.value))
            .collect::<Result<Vec<_>>>()?;

        debug!(shard = route.shard, slot = route.slot, found = values.len(), "get");
        Ok(values)
    }

    // =========================================================================
    // Bytes Mode
    // =========================================================================

    /// Append a payload to a key's history
    ///
    /// An empty key, or a payload of `max_value_size` bytes or more, is
    /// ignored and leaves the store unchanged.
    pub fn put_bytes(&self, key: &str, payload: &[u8]) -> Result<()> {
        self.require_mode(ValueMode::Bytes, "put_bytes")?;
        if key.is_empty() {
            trace!("put_bytes ignored: empty key");
            return Ok(());
        }
        if payload.len() >= self.config.max_value_size {
            trace!(
                len = payload.len(),
                max = self.config.max_value_size,
                "put_bytes ignored: payload too large"
            );
            return Ok(());
        }

        let route = self.route(key);
        self.shard(route.shard)?.lock().put_bytes(route, payload)
    }

    /// All retained payloads of a key, newest first
    ///
    /// Records whose payload cannot be read are skipped.
    pub fn get_bytes(&self, key: &str) -> Result<Vec<Vec<u8>>> {
        self.require_mode(ValueMode::Bytes, "get_bytes")?;
        if key.is_empty() {
            return Ok(Vec::new());
        }

        let route = self.route(key);
        let shard = self.shard(route.shard)?.lock();
        let mut payloads = Vec::new();
        for entry in shard.chain(route)? {
            let entry = entry?;
            match shard.read_payload(entry.record.value)? {
                Some(payload) => payloads.push(payload),
                None => debug!(
                    shard = route.shard,
                    position = entry.position,
                    offset = entry.record.value,
                    "skipping unreadable payload"
                ),
            }
        }

        debug!(shard = route.shard, slot = route.slot, found = payloads.len(), "get_bytes");
        Ok(payloads)
    }

    // =========================================================================
    // Either Mode
    // =========================================================================

    /// Full records of a key, newest first
    pub fn get_entries(&self, key: &str) -> Result<Vec<FileIndex>> {
        if key.is_empty() {
            return Ok(Vec::new());
        }

        let route = self.route(key);
        let shard = self.shard(route.shard)?.lock();
        let mode = self.config.value_mode;

        let entries = shard
            .chain(route)?
            .map(|entry| {
                entry.map(|e| FileIndex {
                    key: key.to_string(),
                    value: match mode {
                        ValueMode::Scalar => RecordValue::Scalar(e.record.value),
                        ValueMode::Bytes => RecordValue::Offset(e.record.value),
                    },
                    time_elapsed: e.record.time_delta,
                    chain_prev: e.record.prev,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(entries)
    }

    /// Where a key lives
    pub fn route(&self, key: &str) -> Route {
        self.router.route(key.as_bytes())
    }

    /// Snapshot of a shard's header
    pub fn shard_header(&self, shard: u32) -> Option<ShardHeader> {
        self.shards.get(shard as usize).map(|s| s.lock().header())
    }

    /// fsync every shard
    pub fn flush(&self) -> Result<()> {
        for shard in &self.shards {
            shard.lock().sync()?;
        }
        Ok(())
    }

    /// Close the engine, syncing all shard files
    pub fn close(self) -> Result<()> {
        self.flush()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the database directory path
    pub fn database_path(&self) -> &Path {
        &self.config.database_path
    }

    /// Number of open shards
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Path of a shard's index file
    pub fn index_path(&self, shard: u32) -> PathBuf {
        Self::shard_path(&self.config.database_path, shard)
    }

    /// Path of a shard's data log
    pub fn data_path(&self, shard: u32) -> PathBuf {
        Self::shard_path(&self.config.database_path.join(Self::DATA_DIR), shard)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn shard_path(dir: &Path, id: u32) -> PathBuf {
        dir.join(id.to_string())
    }

    fn shard(&self, id: u32) -> Result<&Mutex<Shard>> {
        self.shards
            .get(id as usize)
            .ok_or(RingError::ShardNotOpen { shard: id })
    }

    fn require_mode(&self, mode: ValueMode, op: &'static str) -> Result<()> {
        if self.config.value_mode == mode {
            Ok(())
        } else {
            Err(RingError::ValueMode {
                op,
                mode: self.config.value_mode,
            })
        }
    }
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| RingError::FileIo {
        op: "create_dir",
        path: path.to_path_buf(),
        offset: 0,
        source,
    })
}
