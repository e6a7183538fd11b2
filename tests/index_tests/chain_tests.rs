//! Tests for HashIndex and chain traversal
//!
//! These tests verify:
//! - Slot table formatting and empty buckets
//! - Newest-first traversal with key hash filtering
//! - Termination at ring eviction, self links and corrupt pointers
//!
//! Chains are laid out by hand so every edge of the walk is exercised
//! independently of the put protocol.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use ringkv::binary::{BinaryFile, DEFAULT_MAX_VALUE_SIZE};
use ringkv::index::{HashIndex, IndexLayout, IndexRecord};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_index_file() -> (TempDir, PathBuf, BinaryFile) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("0");
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(true)
        .open(&path)
        .unwrap();
    let file = BinaryFile::new(file, &path, DEFAULT_MAX_VALUE_SIZE);
    (temp_dir, path, file)
}

fn record(key_hash: u32, value: u32, prev: Option<u32>) -> IndexRecord {
    IndexRecord {
        key_hash,
        value,
        time_delta: 0,
        prev,
    }
}

fn values(index: &HashIndex<'_>, slot: u32, key_hash: u32, next_index: u32) -> Vec<u32> {
    index
        .chain(slot, key_hash, next_index)
        .unwrap()
        .map(|entry| entry.unwrap().record.value)
        .collect()
}

// =============================================================================
// Slot Tests
// =============================================================================

#[test]
fn test_format_slots_writes_sentinels() {
    let (_temp, path, file) = setup_index_file();
    let index = HashIndex::new(&file, IndexLayout::new(4, 8));

    index.format_slots().unwrap();

    let raw = fs::read(&path).unwrap();
    assert_eq!(raw.len(), 40 + 16);
    assert!(raw[40..56].iter().all(|&b| b == 0xFF));
    for slot in 0..4 {
        assert_eq!(index.read_slot(slot).unwrap(), None);
    }
}

#[test]
fn test_format_large_slot_table() {
    let (_temp, _path, file) = setup_index_file();
    let index = HashIndex::new(&file, IndexLayout::new(100_000, 4));

    index.format_slots().unwrap();

    assert_eq!(file.len().unwrap(), 40 + 400_000);
    assert_eq!(index.read_slot(0).unwrap(), None);
    assert_eq!(index.read_slot(99_999).unwrap(), None);
}

#[test]
fn test_slot_round_trip_including_zero() {
    let (_temp, _path, file) = setup_index_file();
    let index = HashIndex::new(&file, IndexLayout::new(2, 3));
    index.format_slots().unwrap();

    index.write_slot(1, 0).unwrap();

    assert_eq!(index.read_slot(0).unwrap(), None);
    assert_eq!(index.read_slot(1).unwrap(), Some(0));
}

#[test]
fn test_unformatted_slot_reads_empty() {
    let (_temp, _path, file) = setup_index_file();
    let index = HashIndex::new(&file, IndexLayout::new(2, 3));

    assert_eq!(index.read_slot(1).unwrap(), None);
    assert_eq!(values(&index, 1, 7, 0), Vec::<u32>::new());
}

// =============================================================================
// Traversal Tests
// =============================================================================

#[test]
fn test_empty_bucket_yields_nothing() {
    let (_temp, _path, file) = setup_index_file();
    let index = HashIndex::new(&file, IndexLayout::new(2, 3));
    index.format_slots().unwrap();

    assert!(values(&index, 0, 7, 0).is_empty());
}

#[test]
fn test_full_ring_newest_first() {
    let (_temp, _path, file) = setup_index_file();
    let index = HashIndex::new(&file, IndexLayout::new(2, 3));
    index.format_slots().unwrap();

    index.write_record(0, &record(7, 1, None)).unwrap();
    index.write_record(1, &record(7, 2, Some(0))).unwrap();
    index.write_record(2, &record(7, 3, Some(1))).unwrap();
    index.write_slot(0, 2).unwrap();

    // Three writes into a ring of three: cursor is back at 0
    assert_eq!(values(&index, 0, 7, 0), vec![3, 2, 1]);
}

#[test]
fn test_wraparound_evicts_oldest() {
    let (_temp, _path, file) = setup_index_file();
    let index = HashIndex::new(&file, IndexLayout::new(2, 3));
    index.format_slots().unwrap();

    index.write_record(0, &record(7, 1, None)).unwrap();
    index.write_record(1, &record(7, 2, Some(0))).unwrap();
    index.write_record(2, &record(7, 3, Some(1))).unwrap();
    index.write_record(0, &record(7, 4, Some(2))).unwrap();
    index.write_slot(0, 0).unwrap();

    // Record 1 still points at position 0, which now holds the newest value
    assert_eq!(values(&index, 0, 7, 1), vec![4, 3, 2]);
}

#[test]
fn test_collisions_are_filtered() {
    let (_temp, _path, file) = setup_index_file();
    let index = HashIndex::new(&file, IndexLayout::new(2, 3));
    index.format_slots().unwrap();

    index.write_record(0, &record(7, 1, None)).unwrap();
    index.write_record(1, &record(9, 100, Some(0))).unwrap();
    index.write_record(2, &record(7, 2, Some(1))).unwrap();
    index.write_slot(1, 2).unwrap();

    assert_eq!(values(&index, 1, 7, 0), vec![2, 1]);
    assert_eq!(values(&index, 1, 9, 0), vec![100]);
    assert!(values(&index, 1, 8, 0).is_empty());
}

#[test]
fn test_bucket_evicted_by_other_bucket() {
    let (_temp, _path, file) = setup_index_file();
    let index = HashIndex::new(&file, IndexLayout::new(2, 3));
    index.format_slots().unwrap();

    // Bucket 0 gets one record, then bucket 1 fills the ring and overwrites it
    index.write_record(0, &record(10, 1, None)).unwrap();
    index.write_slot(0, 0).unwrap();
    index.write_record(1, &record(11, 2, None)).unwrap();
    index.write_record(2, &record(11, 3, Some(1))).unwrap();
    index.write_record(0, &record(11, 4, Some(2))).unwrap();
    index.write_slot(1, 0).unwrap();

    assert!(values(&index, 0, 10, 1).is_empty());
    assert_eq!(values(&index, 1, 11, 1), vec![4, 3, 2]);
}

#[test]
fn test_single_record_ring_self_link() {
    let (_temp, _path, file) = setup_index_file();
    let index = HashIndex::new(&file, IndexLayout::new(1, 1));
    index.format_slots().unwrap();

    index.write_record(0, &record(7, 2, Some(0))).unwrap();
    index.write_slot(0, 0).unwrap();

    assert_eq!(values(&index, 0, 7, 0), vec![2]);
}

#[test]
fn test_out_of_range_predecessor_ends_chain() {
    let (_temp, _path, file) = setup_index_file();
    let index = HashIndex::new(&file, IndexLayout::new(2, 3));
    index.format_slots().unwrap();

    index.write_record(0, &record(7, 1, Some(99))).unwrap();
    index.write_slot(0, 0).unwrap();

    assert_eq!(values(&index, 0, 7, 1), vec![1]);
}

#[test]
fn test_out_of_range_head_is_empty() {
    let (_temp, _path, file) = setup_index_file();
    let index = HashIndex::new(&file, IndexLayout::new(2, 3));
    index.format_slots().unwrap();

    index.write_slot(0, 3).unwrap();

    assert!(values(&index, 0, 7, 0).is_empty());
}

#[test]
fn test_head_past_end_of_file_is_empty() {
    let (_temp, _path, file) = setup_index_file();
    let index = HashIndex::new(&file, IndexLayout::new(2, 3));
    index.format_slots().unwrap();

    index.write_slot(0, 2).unwrap();

    assert_eq!(index.read_record(2).unwrap(), None);
    assert!(values(&index, 0, 7, 0).is_empty());
}

#[test]
fn test_chain_is_lazy_and_reports_positions() {
    let (_temp, _path, file) = setup_index_file();
    let index = HashIndex::new(&file, IndexLayout::new(2, 4));
    index.format_slots().unwrap();

    index.write_record(0, &record(7, 1, None)).unwrap();
    index.write_record(1, &record(7, 2, Some(0))).unwrap();
    index.write_slot(0, 1).unwrap();

    let mut chain = index.chain(0, 7, 2).unwrap();
    let first = chain.next().unwrap().unwrap();

    assert_eq!(first.position, 1);
    assert_eq!(first.record.value, 2);
    assert_eq!(first.record.prev, Some(0));

    // A fresh call starts again from the head
    assert_eq!(values(&index, 0, 7, 2), vec![2, 1]);
}
