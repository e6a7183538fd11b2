//! Error types for RingKV
//!
//! Provides a unified error type for all operations.
//!
//! Rejected input (empty key, oversized payload) is not an error: those puts
//! return `Ok(())` without touching the store. Absent data (empty bucket,
//! reads past end-of-file) is reported as an empty result, never as `Err`.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ValueMode;

/// Result type alias using RingError
pub type Result<T> = std::result::Result<T, RingError>;

/// Unified error type for RingKV operations
#[derive(Debug, Error)]
pub enum RingError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    /// A file or directory operation failed
    #[error("IO error during {op} at offset {offset} of {}: {source}", .path.display())]
    FileIo {
        op: &'static str,
        path: PathBuf,
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Shard Errors
    // -------------------------------------------------------------------------
    #[error("Shard {shard} is not open")]
    ShardNotOpen { shard: u32 },

    #[error("Shard {shard} has no data log (store opened in scalar mode)")]
    DataLogDisabled { shard: u32 },

    #[error("Data log of shard {shard} is full: record would end at byte {end}")]
    DataLogFull { shard: u32, end: u64 },

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Invalid metadata file {}: {reason}", .path.display())]
    InvalidMeta { path: PathBuf, reason: &'static str },

    // -------------------------------------------------------------------------
    // Usage Errors
    // -------------------------------------------------------------------------
    #[error("{op} is not available in {mode:?} value mode")]
    ValueMode { op: &'static str, mode: ValueMode },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
