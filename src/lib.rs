//! # RingKV
//!
//! An embedded, file-backed key-value store with:
//! - A hash index persisted directly to fixed-layout binary files
//! - Collision chains as singly-linked lists of 16-byte index records
//! - A circular record ring giving every key a bounded, newest-first history
//! - An optional append-only data log for variable-length values
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Engine                               │
//! │            put / get / put_bytes / get_bytes                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  hash(key) mod max_file_count
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Shard (Mutex, one writer)                   │
//! │              header · cursors · write order                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ Hash Index  │  offset  │  Data Log   │
//!   │ slots+ring  │ ───────► │  (bytes)    │
//!   └──────┬──────┘          └──────┬──────┘
//!          │                        │
//!          ▼                        ▼
//!   ┌─────────────────────────────────────┐
//!   │     Binary I/O (positioned, LE)     │
//!   └─────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod binary;
pub mod shard;
pub mod index;
pub mod datalog;
pub mod meta;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{RingError, Result};
pub use config::{Config, OpenMode, SyncStrategy, ValueMode};
pub use engine::Engine;
pub use index::{FileIndex, RecordValue};
pub use shard::{Crc32Hasher, KeyHasher, Route};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of RingKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
