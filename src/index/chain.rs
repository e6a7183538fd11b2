//! Chain Iterator
//!
//! Lazy newest → oldest walk of one bucket chain.

use crate::error::Result;

use super::{HashIndex, IndexRecord};

/// A matching record and the ring position it was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainEntry {
    pub position: u32,
    pub record: IndexRecord,
}

/// Iterator over the records of a bucket chain that carry one key hash
///
/// A predecessor is followed only while it is strictly older than the current
/// record in ring write order. Once the ring wraps, an evicted predecessor
/// holds a newer record, so the walk stops exactly where eviction cut the
/// chain, and it can never visit more than `record_count` records.
pub struct ChainIter<'a> {
    index: HashIndex<'a>,
    cursor: Option<u32>,
    key_hash: u32,
    next_index: u32,
}

impl<'a> ChainIter<'a> {
    pub(super) fn new(
        index: HashIndex<'a>,
        head: Option<u32>,
        key_hash: u32,
        next_index: u32,
    ) -> Self {
        Self {
            index,
            cursor: head,
            key_hash,
            next_index,
        }
    }

    /// Records written after `position`; the newest record has age 0
    fn age(&self, position: u32) -> u64 {
        let capacity = self.index.layout().record_count() as u64;
        (self.next_index as u64 + capacity - 1 - position as u64 % capacity) % capacity
    }

    fn is_live_predecessor(&self, current: u32, prev: u32) -> bool {
        prev < self.index.layout().record_count() && self.age(prev) > self.age(current)
    }
}

impl<'a> Iterator for ChainIter<'a> {
    type Item = Result<ChainEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let position = self.cursor.take()?;

            let record = match self.index.read_record(position) {
                Ok(Some(record)) => record,
                // Unwritten tail of the file
                Ok(None) => return None,
                Err(e) => return Some(Err(e)),
            };

            self.cursor = record
                .prev
                .filter(|&prev| self.is_live_predecessor(position, prev));

            if record.key_hash == self.key_hash {
                return Some(Ok(ChainEntry { position, record }));
            }
        }
    }
}
