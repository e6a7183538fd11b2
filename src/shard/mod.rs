//! Shard Module
//!
//! One independent index file (plus data log in bytes mode) and the put/get
//! protocol over it.
//!
//! ## Write Order
//! ```text
//!   payload ──► index record ──► header (end time, cursors) ──► slot
//!                                                               ▲
//!                                                        commit point
//! ```
//! Readers only reach records through a slot, so a put interrupted before
//! the slot write leaves an orphan that is never observed.

pub mod header;
pub mod router;

use std::fs::OpenOptions;
use std::path::Path;

use tracing::debug;

use crate::binary::BinaryFile;
use crate::config::{Config, OpenMode, SyncStrategy};
use crate::datalog::DataLog;
use crate::error::{Result, RingError};
use crate::index::{ChainIter, HashIndex, IndexLayout, IndexRecord};

pub use header::{ShardHeader, HEADER_SIZE};
pub use router::{Crc32Hasher, KeyHasher, Route, ShardRouter};

/// A single shard
///
/// Not internally synchronized: the engine keeps each shard behind its own
/// mutex, which makes that lock the single writer for the shard's cursors.
#[derive(Debug)]
pub struct Shard {
    id: u32,
    index: BinaryFile,
    data: Option<DataLog>,
    header: ShardHeader,
    layout: IndexLayout,
    sync_strategy: SyncStrategy,
}

impl Shard {
    /// Open (creating if needed) the files of shard `id`
    ///
    /// `data_path` is `None` in scalar mode.
    pub fn open(id: u32, index_path: &Path, data_path: Option<&Path>, config: &Config) -> Result<Self> {
        let index = open_file(index_path, config)?;
        let data = data_path
            .map(|path| open_file(path, config).map(|file| DataLog::new(id, file)))
            .transpose()?;
        let header = ShardHeader::load(&index)?;

        Ok(Self {
            id,
            index,
            data,
            header,
            layout: IndexLayout::new(config.max_slot_count, config.max_index_count),
            sync_strategy: config.sync_strategy,
        })
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Append a scalar record to the key's bucket chain
    pub fn put_scalar(&mut self, route: Route, value: u32) -> Result<()> {
        let now = header::unix_now();
        self.ensure_initialized(now)?;
        self.commit_record(route, value, now)?;

        debug!(shard = self.id, slot = route.slot, value, "scalar put");
        Ok(())
    }

    /// Append a payload to the data log and link it into the key's chain
    pub fn put_bytes(&mut self, route: Route, payload: &[u8]) -> Result<()> {
        if self.data.is_none() {
            return Err(RingError::DataLogDisabled { shard: self.id });
        }
        let now = header::unix_now();
        self.ensure_initialized(now)?;

        let placement = match &self.data {
            Some(data) => data.append(self.header.next_data, payload)?,
            None => return Err(RingError::DataLogDisabled { shard: self.id }),
        };
        self.header.set_data_cursor(&self.index, placement.next)?;
        self.commit_record(route, placement.offset, now)?;

        debug!(
            shard = self.id,
            slot = route.slot,
            offset = placement.offset,
            len = payload.len(),
            "bytes put"
        );
        Ok(())
    }

    /// Write the index record, advance the header, then commit the slot
    fn commit_record(&mut self, route: Route, value: u32, now: u64) -> Result<()> {
        let index = HashIndex::new(&self.index, self.layout);
        let old_head = index.read_slot(route.slot)?;
        let position = self.header.next_index;

        let record = IndexRecord {
            key_hash: route.key_hash,
            value,
            time_delta: self.header.elapsed_since_begin(now),
            prev: old_head,
        };
        index.write_record(position, &record)?;

        self.header.set_end_time(&self.index, now)?;
        self.header
            .advance_index_cursor(&self.index, self.layout.record_count())?;

        if self.sync_strategy == SyncStrategy::EveryWrite {
            self.sync()?;
        }

        index.write_slot(route.slot, position)?;

        if self.sync_strategy == SyncStrategy::EveryWrite {
            self.index.sync_data()?;
        }

        debug!(
            shard = self.id,
            slot = route.slot,
            position,
            prev = ?old_head,
            next_index = self.header.next_index,
            "index record committed"
        );
        Ok(())
    }

    /// Format the slot table and stamp the begin time on the first write
    fn ensure_initialized(&mut self, now: u64) -> Result<()> {
        if self.header.is_initialized() {
            return Ok(());
        }
        HashIndex::new(&self.index, self.layout).format_slots()?;
        let begin = self.header.begin_time(&self.index, now)?;

        debug!(shard = self.id, begin, "shard initialized");
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Lazy walk of the records carrying `route.key_hash`, newest first
    pub fn chain(&self, route: Route) -> Result<ChainIter<'_>> {
        HashIndex::new(&self.index, self.layout).chain(
            route.slot,
            route.key_hash,
            self.header.next_index,
        )
    }

    /// Payload stored at a data log offset, `None` if unreadable
    pub fn read_payload(&self, offset: u32) -> Result<Option<Vec<u8>>> {
        match &self.data {
            Some(data) => data.read(offset),
            None => Err(RingError::DataLogDisabled { shard: self.id }),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Snapshot of the header
    pub fn header(&self) -> ShardHeader {
        self.header
    }

    pub fn layout(&self) -> IndexLayout {
        self.layout
    }

    pub fn index_file(&self) -> &BinaryFile {
        &self.index
    }

    pub fn data_log(&self) -> Option<&DataLog> {
        self.data.as_ref()
    }

    /// fsync the data log then the index file
    pub fn sync(&self) -> Result<()> {
        if let Some(data) = &self.data {
            data.file().sync_data()?;
        }
        self.index.sync_data()
    }
}

fn open_file(path: &Path, config: &Config) -> Result<BinaryFile> {
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(config.open_mode == OpenMode::Truncate)
        .open(path)
        .map_err(|source| RingError::FileIo {
            op: "open",
            path: path.to_path_buf(),
            offset: 0,
            source,
        })?;
    Ok(BinaryFile::new(file, path, config.max_value_size))
}
