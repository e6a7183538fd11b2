//! Tests for DataLog
//!
//! These tests verify:
//! - Length-prefixed payload layout
//! - Read of missing, truncated and garbage records
//! - The placement scan: append at the cursor, skip complete records left
//!   behind a stale cursor, overwrite torn tails

use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use ringkv::binary::{BinaryFile, DEFAULT_MAX_VALUE_SIZE};
use ringkv::datalog::{DataLog, Placement};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_data_log() -> (TempDir, PathBuf, DataLog) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("0");
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(true)
        .open(&path)
        .unwrap();
    let log = DataLog::new(0, BinaryFile::new(file, &path, DEFAULT_MAX_VALUE_SIZE));
    (temp_dir, path, log)
}

// =============================================================================
// Append / Read Tests
// =============================================================================

#[test]
fn test_append_writes_length_prefix_and_payload() {
    let (_temp, path, log) = setup_data_log();

    let placement = log.append(0, b"111").unwrap();

    assert_eq!(placement, Placement { offset: 0, next: 7 });
    assert_eq!(fs::read(&path).unwrap(), vec![3, 0, 0, 0, b'1', b'1', b'1']);
}

#[test]
fn test_sequential_appends() {
    let (_temp, _path, log) = setup_data_log();

    let a = log.append(0, b"111").unwrap();
    let b = log.append(a.next, b"2222").unwrap();
    let c = log.append(b.next, b"333333").unwrap();

    assert_eq!((a.offset, b.offset, c.offset), (0, 7, 15));
    assert_eq!(c.next, 25);
    assert_eq!(log.read(0).unwrap(), Some(b"111".to_vec()));
    assert_eq!(log.read(7).unwrap(), Some(b"2222".to_vec()));
    assert_eq!(log.read(15).unwrap(), Some(b"333333".to_vec()));
}

#[test]
fn test_empty_payload_round_trip() {
    let (_temp, _path, log) = setup_data_log();

    let placement = log.append(0, b"").unwrap();
    let after = log.append(placement.next, b"x").unwrap();

    assert_eq!(placement.next, 4);
    assert_eq!(after.offset, 4);
    assert_eq!(log.read(0).unwrap(), Some(Vec::new()));
    assert_eq!(log.read(4).unwrap(), Some(b"x".to_vec()));
}

#[test]
fn test_large_payload_round_trip() {
    let (_temp, _path, log) = setup_data_log();
    let payload: Vec<u8> = (0..DEFAULT_MAX_VALUE_SIZE - 1).map(|i| (i % 251) as u8).collect();

    let placement = log.append(0, &payload).unwrap();

    assert_eq!(log.read(placement.offset).unwrap(), Some(payload));
}

#[test]
fn test_read_past_end_is_none() {
    let (_temp, _path, log) = setup_data_log();

    assert_eq!(log.read(0).unwrap(), None);

    log.append(0, b"abc").unwrap();
    assert_eq!(log.read(7).unwrap(), None);
}

#[test]
fn test_read_truncated_record_is_none() {
    let (_temp, _path, log) = setup_data_log();

    log.file().write_u32(0, 10).unwrap();
    log.file().write_at(4, b"short").unwrap();

    assert_eq!(log.read(0).unwrap(), None);
}

#[test]
fn test_read_garbage_length_is_none() {
    let (_temp, _path, log) = setup_data_log();

    log.file().write_u32(0, DEFAULT_MAX_VALUE_SIZE as u32).unwrap();
    log.file().write_at(4, &vec![0u8; DEFAULT_MAX_VALUE_SIZE]).unwrap();

    assert_eq!(log.read(0).unwrap(), None);
}

// =============================================================================
// Placement Scan Tests
// =============================================================================

#[test]
fn test_scan_at_end_of_file_places_at_cursor() {
    let (_temp, _path, log) = setup_data_log();

    assert_eq!(log.next_available_write_pos(0, 10).unwrap(), 0);

    let a = log.append(0, b"abc").unwrap();
    assert_eq!(log.next_available_write_pos(a.next, 10).unwrap(), a.next);
}

#[test]
fn test_scan_skips_records_behind_stale_cursor() {
    let (_temp, _path, log) = setup_data_log();

    let a = log.append(0, b"111").unwrap();
    // Two records written, but the persisted cursor never moved past the first
    log.append(a.next, b"2222").unwrap();
    log.append(15, b"333333").unwrap();

    assert_eq!(log.next_available_write_pos(a.next, 1).unwrap(), 25);

    let d = log.append(a.next, b"1").unwrap();
    assert_eq!(d.offset, 25);
    assert_eq!(log.read(7).unwrap(), Some(b"2222".to_vec()));
    assert_eq!(log.read(15).unwrap(), Some(b"333333".to_vec()));
    assert_eq!(log.read(25).unwrap(), Some(b"1".to_vec()));
}

#[test]
fn test_scan_reuses_torn_tail() {
    let (_temp, _path, log) = setup_data_log();

    let a = log.append(0, b"abc").unwrap();
    // Length prefix promising more bytes than the file holds
    log.file().write_u32(a.next as u64, 100).unwrap();
    log.file().write_at(a.next as u64 + 4, b"xy").unwrap();

    assert_eq!(log.next_available_write_pos(a.next, 5).unwrap(), a.next);

    let b = log.append(a.next, b"hello").unwrap();
    assert_eq!(b.offset, a.next);
    assert_eq!(log.read(b.offset).unwrap(), Some(b"hello".to_vec()));
}

#[test]
fn test_scan_stops_at_garbage_prefix() {
    let (_temp, _path, log) = setup_data_log();

    log.file().write_at(0, &[0xEE; 64]).unwrap();

    assert_eq!(log.next_available_write_pos(0, 5).unwrap(), 0);
}

#[test]
fn test_scan_rejects_offset_overflow() {
    let (_temp, _path, log) = setup_data_log();

    let err = log.next_available_write_pos(u32::MAX - 8, 16).unwrap_err();

    assert!(matches!(err, ringkv::RingError::DataLogFull { shard: 0, .. }));
}

#[test]
fn test_scan_rejects_record_ending_at_unset_cursor() {
    let (_temp, _path, log) = setup_data_log();

    // Ending exactly at u32::MAX would persist the "unset" cursor value
    let err = log.next_available_write_pos(u32::MAX - 20, 16).unwrap_err();
    assert!(matches!(
        err,
        ringkv::RingError::DataLogFull { shard: 0, end } if end == u32::MAX as u64
    ));

    assert_eq!(
        log.next_available_write_pos(u32::MAX - 21, 16).unwrap(),
        u32::MAX - 21
    );
}
