//! Shard Header
//!
//! The 40-byte metadata block at offset 0 of every index file.
//!
//! ```text
//! ┌──────────┬───────────┬───────────┬────────────┬────────────┬──────────┐
//! │ Rsv (4)  │ Begin (8) │ End (8)   │ NextIdx(4) │ NextData(4)│ Rsv (12) │
//! └──────────┴───────────┴───────────┴────────────┴────────────┴──────────┘
//!  0          4           12          20           24           28      40
//! ```
//!
//! The header is cached in memory and written through on every mutation, so
//! the cursors are shard-owned fields rather than re-read on each put.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::binary::{BinaryFile, EMPTY_U32};
use crate::error::Result;

/// Size of the header region
pub const HEADER_SIZE: u64 = 40;

const BEGIN_TIME_OFFSET: u64 = 4;
const END_TIME_OFFSET: u64 = 12;
const NEXT_INDEX_OFFSET: u64 = 20;
const NEXT_DATA_OFFSET: u64 = 24;

/// In-memory copy of a shard header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShardHeader {
    /// Unix seconds of the first write, 0 until then
    pub begin_time: u64,
    /// Unix seconds of the most recent write
    pub end_time: u64,
    /// Ring position the next index record goes to
    pub next_index: u32,
    /// Data log cursor for the next payload
    pub next_data: u32,
}

impl ShardHeader {
    /// Load the header from an index file
    ///
    /// Fields beyond end-of-file read as zero; an unset cursor (`EMPTY_U32`)
    /// also reads as zero.
    pub fn load(file: &BinaryFile) -> Result<Self> {
        Ok(Self {
            begin_time: file.read_u64(BEGIN_TIME_OFFSET)?,
            end_time: file.read_u64(END_TIME_OFFSET)?,
            next_index: cursor_or_zero(file.read_u32(NEXT_INDEX_OFFSET)?),
            next_data: cursor_or_zero(file.read_u32(NEXT_DATA_OFFSET)?),
        })
    }

    /// True once the shard has seen its first write
    pub fn is_initialized(&self) -> bool {
        self.begin_time != 0
    }

    /// Begin time, assigned and persisted on first use
    pub fn begin_time(&mut self, file: &BinaryFile, now: u64) -> Result<u64> {
        if self.begin_time == 0 {
            // 0 means "unset" on disk
            let now = now.max(1);
            file.write_u64(BEGIN_TIME_OFFSET, now)?;
            self.begin_time = now;
        }
        Ok(self.begin_time)
    }

    /// Record the time of the most recent write
    pub fn set_end_time(&mut self, file: &BinaryFile, now: u64) -> Result<()> {
        file.write_u64(END_TIME_OFFSET, now)?;
        self.end_time = now;
        Ok(())
    }

    /// Move the index cursor one record forward, wrapping at `capacity`
    pub fn advance_index_cursor(&mut self, file: &BinaryFile, capacity: u32) -> Result<u32> {
        let next = (self.next_index as u64 + 1) % capacity as u64;
        file.write_u32(NEXT_INDEX_OFFSET, next as u32)?;
        self.next_index = next as u32;
        Ok(self.next_index)
    }

    /// Persist a new data log cursor
    pub fn set_data_cursor(&mut self, file: &BinaryFile, pos: u32) -> Result<()> {
        file.write_u32(NEXT_DATA_OFFSET, pos)?;
        self.next_data = pos;
        Ok(())
    }

    /// Seconds since `begin_time`, clamped to the record field width
    pub fn elapsed_since_begin(&self, now: u64) -> u32 {
        now.saturating_sub(self.begin_time).min(u32::MAX as u64) as u32
    }
}

fn cursor_or_zero(raw: u32) -> u32 {
    if raw == EMPTY_U32 {
        0
    } else {
        raw
    }
}

/// Current Unix time in seconds
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
