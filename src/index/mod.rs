//! Hash Index Module
//!
//! The slot table and the index record ring of one shard's index file.
//!
//! ## Responsibilities
//! - Map bucket → newest record (slot table)
//! - Store fixed-size chain nodes in a circular ring
//! - Walk a bucket chain newest → oldest, stopping where ring wraparound
//!   evicted the rest of it
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Header (40 bytes)                       │
//! ├─────────────────────────────────────────┤
//! │ Slot Table (4 × max_slot_count)         │
//! │   [HeadIndex: u32]  0xFFFFFFFF = empty  │
//! ├─────────────────────────────────────────┤
//! │ Record Ring (16 × max_index_count)      │
//! │   [KeyHash][Value][TimeDelta][Prev]     │
//! └─────────────────────────────────────────┘
//! ```

mod chain;
mod record;

pub use chain::{ChainEntry, ChainIter};
pub use record::{FileIndex, IndexRecord, RecordValue, INDEX_RECORD_SIZE};

use crate::binary::{BinaryFile, EMPTY_U32};
use crate::error::Result;
use crate::shard::header::HEADER_SIZE;

/// Size of one slot
pub const SLOT_SIZE: u64 = 4;

/// Slots are formatted in runs of this many bytes
const FORMAT_CHUNK: usize = 64 * 1024;

/// Byte offsets of the slot table and record ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexLayout {
    slot_count: u32,
    record_count: u32,
}

impl IndexLayout {
    pub fn new(slot_count: u32, record_count: u32) -> Self {
        Self {
            slot_count,
            record_count,
        }
    }

    pub fn slot_count(&self) -> u32 {
        self.slot_count
    }

    /// Ring capacity
    pub fn record_count(&self) -> u32 {
        self.record_count
    }

    /// Absolute offset of a slot
    pub fn slot_offset(&self, slot: u32) -> u64 {
        HEADER_SIZE + slot as u64 * SLOT_SIZE
    }

    /// Absolute offset of the first ring record
    pub fn records_start(&self) -> u64 {
        HEADER_SIZE + self.slot_count as u64 * SLOT_SIZE
    }

    /// Absolute offset of a ring record
    pub fn record_offset(&self, index: u32) -> u64 {
        self.records_start() + index as u64 * INDEX_RECORD_SIZE
    }

    /// Size of a fully written index file
    pub fn file_size(&self) -> u64 {
        self.records_start() + self.record_count as u64 * INDEX_RECORD_SIZE
    }
}

/// Slot and record access over one index file
#[derive(Debug, Clone, Copy)]
pub struct HashIndex<'a> {
    file: &'a BinaryFile,
    layout: IndexLayout,
}

impl<'a> HashIndex<'a> {
    pub fn new(file: &'a BinaryFile, layout: IndexLayout) -> Self {
        Self { file, layout }
    }

    pub fn layout(&self) -> IndexLayout {
        self.layout
    }

    /// Fill the slot table with the empty sentinel
    pub fn format_slots(&self) -> Result<()> {
        let mut offset = self.layout.slot_offset(0);
        let end = self.layout.records_start();
        let chunk = vec![0xFFu8; FORMAT_CHUNK.min((end - offset) as usize)];
        while offset < end {
            let n = chunk.len().min((end - offset) as usize);
            self.file.write_at(offset, &chunk[..n])?;
            offset += n as u64;
        }
        Ok(())
    }

    /// Head of a bucket's chain, `None` if the bucket was never written
    pub fn read_slot(&self, slot: u32) -> Result<Option<u32>> {
        let head = self.file.read_u32(self.layout.slot_offset(slot))?;
        Ok((head != EMPTY_U32).then_some(head))
    }

    /// Point a bucket at a new chain head
    pub fn write_slot(&self, slot: u32, index: u32) -> Result<()> {
        self.file.write_u32(self.layout.slot_offset(slot), index)
    }

    /// Read a ring record, `None` if it lies past end-of-file
    pub fn read_record(&self, index: u32) -> Result<Option<IndexRecord>> {
        Ok(self
            .file
            .read_array::<{ INDEX_RECORD_SIZE as usize }>(self.layout.record_offset(index))?
            .map(|buf| IndexRecord::decode(&buf)))
    }

    /// Write a ring record
    pub fn write_record(&self, index: u32, record: &IndexRecord) -> Result<()> {
        self.file
            .write_at(self.layout.record_offset(index), &record.encode())
    }

    /// Iterate the records of `slot` whose hash equals `key_hash`, newest first
    ///
    /// `next_index` is the shard's current ring cursor; it dates every record
    /// so the walk can tell a live predecessor from an overwritten one.
    pub fn chain(&self, slot: u32, key_hash: u32, next_index: u32) -> Result<ChainIter<'a>> {
        let head = self
            .read_slot(slot)?
            .filter(|&head| head < self.layout.record_count);
        Ok(ChainIter::new(*self, head, key_hash, next_index))
    }
}
