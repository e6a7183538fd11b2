//! Store Metadata
//!
//! The geometry and value mode a database was created with, kept in
//! `{database_path}/meta` so a preserved store is never reopened with a
//! layout that reads its files differently.
//!
//! ## File Format
//! ```text
//! ┌────────────┬─────────┬──────────┬───────────┬───────────┬────────────┬─────────┬─────────┐
//! │ Magic (8)  │ Ver (2) │ Mode (2) │ Files (4) │ Slots (4) │ Records (4)│ Rsv (4) │ CRC (4) │
//! └────────────┴─────────┴──────────┴───────────┴───────────┴────────────┴─────────┴─────────┘
//!  0            8         10         12          16          20           24        28      32
//! ```
//! All integers little-endian. The CRC32 covers bytes `[0, 28)`.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use crate::config::{Config, ValueMode};
use crate::error::{Result, RingError};

/// Size of the metadata file
pub const META_SIZE: usize = 32;

const MAGIC: &[u8; 8] = b"ringkv.m";
const VERSION: u16 = 1;
const CRC_OFFSET: usize = META_SIZE - 4;

/// Layout-defining settings of a database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreMeta {
    pub file_count: u32,
    pub slot_count: u32,
    pub index_count: u32,
    pub value_mode: ValueMode,
}

impl StoreMeta {
    pub fn from_config(config: &Config) -> Self {
        Self {
            file_count: config.max_file_count,
            slot_count: config.max_slot_count,
            index_count: config.max_index_count,
            value_mode: config.value_mode,
        }
    }

    /// Encode to the on-disk layout
    pub fn encode(&self) -> [u8; META_SIZE] {
        let mut buf = [0u8; META_SIZE];
        buf[0..8].copy_from_slice(MAGIC);
        buf[8..10].copy_from_slice(&VERSION.to_le_bytes());
        buf[10..12].copy_from_slice(&mode_code(self.value_mode).to_le_bytes());
        buf[12..16].copy_from_slice(&self.file_count.to_le_bytes());
        buf[16..20].copy_from_slice(&self.slot_count.to_le_bytes());
        buf[20..24].copy_from_slice(&self.index_count.to_le_bytes());
        let crc = crc32fast::hash(&buf[..CRC_OFFSET]);
        buf[CRC_OFFSET..].copy_from_slice(&crc.to_le_bytes());
        buf
    }

    /// Decode from the on-disk layout
    ///
    /// The error string names the first check that failed.
    pub fn decode(buf: &[u8]) -> std::result::Result<Self, &'static str> {
        if buf.len() != META_SIZE {
            return Err("wrong size");
        }
        let u16_at = |i: usize| u16::from_le_bytes([buf[i], buf[i + 1]]);
        let u32_at = |i: usize| u32::from_le_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]);

        if crc32fast::hash(&buf[..CRC_OFFSET]) != u32_at(CRC_OFFSET) {
            return Err("checksum mismatch");
        }
        if &buf[0..8] != MAGIC {
            return Err("not a ringkv metadata file");
        }
        if u16_at(8) != VERSION {
            return Err("unsupported version");
        }
        let value_mode = match u16_at(10) {
            1 => ValueMode::Scalar,
            2 => ValueMode::Bytes,
            _ => return Err("unknown value mode"),
        };

        Ok(Self {
            file_count: u32_at(12),
            slot_count: u32_at(16),
            index_count: u32_at(20),
            value_mode,
        })
    }

    /// Read the metadata file, `None` if it does not exist
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let buf = match fs::read(path) {
            Ok(buf) => buf,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(file_error("read", path, source)),
        };
        Self::decode(&buf)
            .map(Some)
            .map_err(|reason| RingError::InvalidMeta {
                path: path.to_path_buf(),
                reason,
            })
    }

    /// Write (replacing) the metadata file and sync it
    pub fn store(&self, path: &Path) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|source| file_error("open", path, source))?;
        file.write_all(&self.encode())
            .map_err(|source| file_error("write", path, source))?;
        file.sync_all()
            .map_err(|source| file_error("sync", path, source))
    }

    /// Fail unless `requested` lays the files out exactly like `self`
    pub fn check_compatible(&self, requested: &StoreMeta) -> Result<()> {
        if self == requested {
            return Ok(());
        }
        Err(RingError::Config(format!(
            "database was created with {}, cannot reopen with {}",
            self.describe(),
            requested.describe()
        )))
    }

    fn describe(&self) -> String {
        format!(
            "files={} slots={} records={} mode={:?}",
            self.file_count, self.slot_count, self.index_count, self.value_mode
        )
    }
}

fn mode_code(mode: ValueMode) -> u16 {
    match mode {
        ValueMode::Scalar => 1,
        ValueMode::Bytes => 2,
    }
}

fn file_error(op: &'static str, path: &Path, source: io::Error) -> RingError {
    RingError::FileIo {
        op,
        path: path.to_path_buf(),
        offset: 0,
        source,
    }
}
