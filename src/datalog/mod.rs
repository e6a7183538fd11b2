//! Data Log Module
//!
//! Per-shard companion file holding variable-length payloads.
//!
//! ## File Format
//! ```text
//! ┌─────────┬──────────────┬─────────┬──────────────┬─────
//! │ Len (4) │ Payload      │ Len (4) │ Payload      │ ...
//! └─────────┴──────────────┴─────────┴──────────────┴─────
//! ```
//! Index records address a payload by the absolute offset of its length
//! prefix.
//!
//! ## Placement
//! The log is append-only and record-aligned. A new payload goes to the
//! first free position at or after the shard's data cursor: any well-formed
//! record found at the cursor (left there by a put that never reached its
//! header update) is skipped, never overwritten. Space held by records whose
//! index entries were evicted is not reclaimed.

use tracing::debug;

use crate::binary::{BinaryFile, EMPTY_U32};
use crate::error::{Result, RingError};

/// Size of the length prefix
pub const LENGTH_PREFIX_SIZE: u64 = 4;

/// Where a payload was written and where the cursor moves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Offset of the record's length prefix
    pub offset: u32,
    /// First byte after the record
    pub next: u32,
}

/// One shard's data log
#[derive(Debug)]
pub struct DataLog {
    shard: u32,
    file: BinaryFile,
}

impl DataLog {
    pub fn new(shard: u32, file: BinaryFile) -> Self {
        Self { shard, file }
    }

    /// Write a payload at the first free position from `cursor`
    ///
    /// The caller has already rejected payloads at or above the max value
    /// size.
    pub fn append(&self, cursor: u32, payload: &[u8]) -> Result<Placement> {
        let offset = self.next_available_write_pos(cursor, payload.len())?;
        let start = offset as u64;

        self.file.write_u32(start, payload.len() as u32)?;
        self.file.write_bytes(start + LENGTH_PREFIX_SIZE, payload)?;

        let next = start + LENGTH_PREFIX_SIZE + payload.len() as u64;
        Ok(Placement {
            offset,
            next: next as u32,
        })
    }

    /// Read the payload whose length prefix sits at `offset`
    ///
    /// `None` when the prefix or the payload is missing or implausible.
    pub fn read(&self, offset: u32) -> Result<Option<Vec<u8>>> {
        let start = offset as u64;
        let len = self.file.read_u32(start)?;
        if len == EMPTY_U32 {
            return Ok(None);
        }
        self.file.read_bytes(start + LENGTH_PREFIX_SIZE, len as usize)
    }

    /// Reuse scan: the first free, record-aligned position at or after `cursor`
    ///
    /// Walks forward over complete records. Stops at end-of-file, or at a
    /// prefix that cannot start a complete record (torn tail or garbage),
    /// which is free to overwrite.
    pub fn next_available_write_pos(&self, cursor: u32, payload_len: usize) -> Result<u32> {
        let file_len = self.file.len()?;
        let max_value_size = self.file.max_value_size() as u64;
        let mut pos = cursor as u64;
        let mut skipped = 0u32;

        loop {
            let len = self.file.read_u32(pos)?;
            if len == EMPTY_U32 || len as u64 >= max_value_size {
                break;
            }
            let end = pos + LENGTH_PREFIX_SIZE + len as u64;
            if end > file_len {
                break;
            }
            pos = end;
            skipped += 1;
        }

        if skipped > 0 {
            debug!(
                shard = self.shard,
                cursor,
                pos,
                skipped,
                "data cursor skipped occupied records"
            );
        }

        // u32::MAX is the on-disk "unset" cursor, so no record may end there
        let end = pos + LENGTH_PREFIX_SIZE + payload_len as u64;
        if end >= u32::MAX as u64 {
            return Err(RingError::DataLogFull {
                shard: self.shard,
                end,
            });
        }
        Ok(pos as u32)
    }

    /// The underlying file
    pub fn file(&self) -> &BinaryFile {
        &self.file
    }
}
