//! Binary I/O Primitives
//!
//! Fixed-width little-endian reads and writes at absolute file offsets.
//!
//! ## End-of-file Behavior
//! ```text
//! ┌──────────────┬────────────────────────────────────────────┐
//! │ read_u32     │ u32::MAX (the "empty" sentinel)            │
//! │ read_u64     │ 0                                          │
//! │ read_bytes   │ None                                       │
//! └──────────────┴────────────────────────────────────────────┘
//! ```
//! A short read (the file ends inside the requested range) counts as EOF.
//!
//! All access is positioned (`pread`/`pwrite` style), so a shared `&BinaryFile`
//! never disturbs a seek cursor.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::FileExt;
#[cfg(windows)]
use std::os::windows::fs::FileExt;

use crate::error::{Result, RingError};

/// Sentinel returned by `read_u32` past end-of-file, and stored on disk for
/// "empty slot" / "no predecessor"
pub const EMPTY_U32: u32 = u32::MAX;

/// Payloads of this many bytes or more are rejected
pub const DEFAULT_MAX_VALUE_SIZE: usize = 65535;

/// An open file accessed by absolute offset
#[derive(Debug)]
pub struct BinaryFile {
    file: File,
    path: PathBuf,
    max_value_size: usize,
}

impl BinaryFile {
    /// Wrap an already opened file
    pub fn new(file: File, path: impl Into<PathBuf>, max_value_size: usize) -> Self {
        Self {
            file,
            path: path.into(),
            max_value_size,
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Read a little-endian u32, or `EMPTY_U32` past end-of-file
    pub fn read_u32(&self, offset: u64) -> Result<u32> {
        Ok(self
            .read_array::<4>(offset)?
            .map(u32::from_le_bytes)
            .unwrap_or(EMPTY_U32))
    }

    /// Read a little-endian u64, or 0 past end-of-file
    pub fn read_u64(&self, offset: u64) -> Result<u64> {
        Ok(self
            .read_array::<8>(offset)?
            .map(u64::from_le_bytes)
            .unwrap_or(0))
    }

    /// Read `len` raw bytes
    ///
    /// Returns `None` when the range is not fully inside the file, or when
    /// `len` is at least the configured max value size (a length that large
    /// can only come from garbage).
    pub fn read_bytes(&self, offset: u64, len: usize) -> Result<Option<Vec<u8>>> {
        if len >= self.max_value_size {
            return Ok(None);
        }
        let mut buf = vec![0u8; len];
        if self.read_full(&mut buf, offset)? {
            Ok(Some(buf))
        } else {
            Ok(None)
        }
    }

    /// Read exactly `N` bytes, or `None` past end-of-file
    pub fn read_array<const N: usize>(&self, offset: u64) -> Result<Option<[u8; N]>> {
        let mut buf = [0u8; N];
        if self.read_full(&mut buf, offset)? {
            Ok(Some(buf))
        } else {
            Ok(None)
        }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Write a little-endian u32
    pub fn write_u32(&self, offset: u64, value: u32) -> Result<()> {
        self.write_at(offset, &value.to_le_bytes())
    }

    /// Write a little-endian u64
    pub fn write_u64(&self, offset: u64, value: u64) -> Result<()> {
        self.write_at(offset, &value.to_le_bytes())
    }

    /// Write a payload; a no-op when it is empty or not below the max value size
    pub fn write_bytes(&self, offset: u64, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() || bytes.len() >= self.max_value_size {
            return Ok(());
        }
        self.write_at(offset, bytes)
    }

    /// Write a fixed-layout block (header field, slot run, index record)
    pub fn write_at(&self, offset: u64, buf: &[u8]) -> Result<()> {
        let mut written = 0;
        while written < buf.len() {
            match pwrite(&self.file, &buf[written..], offset + written as u64) {
                Ok(0) => {
                    return Err(self.io_error(
                        "write",
                        offset,
                        io::Error::new(io::ErrorKind::WriteZero, "failed to write whole buffer"),
                    ))
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.io_error("write", offset, e)),
            }
        }
        Ok(())
    }

    // =========================================================================
    // File-level
    // =========================================================================

    /// Current file length in bytes
    pub fn len(&self) -> Result<u64> {
        self.file
            .metadata()
            .map(|m| m.len())
            .map_err(|e| self.io_error("stat", 0, e))
    }

    /// Whether the file has no bytes yet
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Flush file contents to disk
    pub fn sync_data(&self) -> Result<()> {
        self.file
            .sync_data()
            .map_err(|e| self.io_error("sync", 0, e))
    }

    /// Path this file was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Payload size limit (exclusive)
    pub fn max_value_size(&self) -> usize {
        self.max_value_size
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Fill `buf` from `offset`; false when end-of-file cuts the read short
    fn read_full(&self, buf: &mut [u8], offset: u64) -> Result<bool> {
        let mut filled = 0;
        while filled < buf.len() {
            match pread(&self.file, &mut buf[filled..], offset + filled as u64) {
                Ok(0) => return Ok(false),
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.io_error("read", offset, e)),
            }
        }
        Ok(true)
    }

    fn io_error(&self, op: &'static str, offset: u64, source: io::Error) -> RingError {
        RingError::FileIo {
            op,
            path: self.path.clone(),
            offset,
            source,
        }
    }
}

#[cfg(unix)]
fn pread(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    file.read_at(buf, offset)
}

#[cfg(unix)]
fn pwrite(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
    file.write_at(buf, offset)
}

#[cfg(windows)]
fn pread(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    file.seek_read(buf, offset)
}

#[cfg(windows)]
fn pwrite(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
    file.seek_write(buf, offset)
}
