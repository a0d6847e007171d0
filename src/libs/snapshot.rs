//! Snapshot store: the latest known record per key.
//!
//! A [`Snapshot`] is rebuilt wholesale from every successful poll and never mutated in
//! place afterwards. Iteration order is the order in which keys were first seen in the
//! poll payload, which keeps grouping tie-breaks deterministic.

use crate::libs::record::{RecordKey, WorkLogRecord};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    records: Vec<WorkLogRecord>,
    index: HashMap<RecordKey, usize>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot with one entry per key.
    ///
    /// Duplicate keys are resolved last-write-wins: the later record replaces the earlier
    /// one but keeps the position where the key first appeared.
    pub fn replace<I>(records: I) -> Self
    where
        I: IntoIterator<Item = WorkLogRecord>,
    {
        let mut snapshot = Self::new();
        for record in records {
            let key = record.key();
            match snapshot.index.get(&key) {
                Some(&position) => snapshot.records[position] = record,
                None => {
                    snapshot.index.insert(key, snapshot.records.len());
                    snapshot.records.push(record);
                }
            }
        }
        snapshot
    }

    pub fn values(&self) -> &[WorkLogRecord] {
        &self.records
    }

    pub fn get(&self, key: &RecordKey) -> Option<&WorkLogRecord> {
        self.index.get(key).map(|&position| &self.records[position])
    }

    pub fn contains_key(&self, key: &RecordKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &RecordKey> {
        self.index.keys()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
