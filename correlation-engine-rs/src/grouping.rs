//! Thread grouping
//!
//! Partitions a flat, execution-ordered slice of trace records into
//! per-thread sequences. Threads are kept in first-seen order and records
//! within a thread keep their original relative order, so downstream output
//! is stable from run to run.

use std::collections::HashMap;

use crate::model::TraceRecord;

/// Ordered per-thread sequences borrowed from the input slice
///
/// Records without a thread id are grouped under the `None` key.
#[derive(Debug, Clone, Default)]
pub struct ThreadGroups<'a> {
    groups: Vec<(Option<String>, Vec<&'a TraceRecord>)>,
    index: HashMap<Option<String>, usize>,
}

impl<'a> ThreadGroups<'a> {
    /// Create an empty grouping
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to its thread's sequence
    pub fn push(&mut self, record: &'a TraceRecord) {
        let key = record.thread_id.clone();
        match self.index.get(&key) {
            Some(&slot) => self.groups[slot].1.push(record),
            None => {
                self.index.insert(key.clone(), self.groups.len());
                self.groups.push((key, vec![record]));
            }
        }
    }

    /// Number of distinct threads
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no records were grouped
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of grouped records
    pub fn record_count(&self) -> usize {
        self.groups.iter().map(|(_, records)| records.len()).sum()
    }

    /// Thread ids in first-seen order
    pub fn thread_ids(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        self.groups.iter().map(|(key, _)| key.as_deref())
    }

    /// Sequence for one thread, if it was seen
    pub fn get(&self, thread_id: Option<&str>) -> Option<&[&'a TraceRecord]> {
        let key = thread_id.map(str::to_owned);
        self.index
            .get(&key)
            .map(|&slot| self.groups[slot].1.as_slice())
    }

    /// Iterate threads in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (Option<&str>, &[&'a TraceRecord])> + '_ {
        self.groups
            .iter()
            .map(|(key, records)| (key.as_deref(), records.as_slice()))
    }
}

/// Group records by thread id, preserving encounter order
pub fn group_by_thread(records: &[TraceRecord]) -> ThreadGroups<'_> {
    let mut groups = ThreadGroups::new();
    for record in records {
        groups.push(record);
    }
    groups
}
