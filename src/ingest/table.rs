use std::collections::{BTreeMap, HashMap, HashSet};

use crate::model::{Message, MonthKey, Thread};

/// Messages of one channel grouped by month, plus its threads.
///
/// Every month bucket is sorted by ascending timestamp and carries
/// up-to-date `trail` flags after each ingested file.
#[derive(Debug, Clone, Default)]
pub struct MessageTable {
    months: BTreeMap<MonthKey, Vec<Message>>,
    threads: HashMap<String, Thread>,
    loaded_files: HashSet<String>,
}

impl MessageTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All month buckets in chronological order.
    #[must_use]
    pub fn months(&self) -> &BTreeMap<MonthKey, Vec<Message>> {
        &self.months
    }

    /// Messages of one month, if any were ingested.
    #[must_use]
    pub fn messages(&self, key: &MonthKey) -> Option<&[Message]> {
        self.months.get(key).map(Vec::as_slice)
    }

    /// Check whether a bucket exists for the month after `key`.
    #[must_use]
    pub fn has_next_month(&self, key: MonthKey) -> bool {
        self.months.contains_key(&key.next())
    }

    /// Check whether a bucket exists for the month before `key`.
    #[must_use]
    pub fn has_prev_month(&self, key: MonthKey) -> bool {
        self.months.contains_key(&key.prev())
    }

    /// Threads keyed by the root's timestamp.
    #[must_use]
    pub fn threads(&self) -> &HashMap<String, Thread> {
        &self.threads
    }

    /// Look up a thread by its root timestamp.
    #[must_use]
    pub fn thread(&self, thread_ts: &str) -> Option<&Thread> {
        self.threads.get(thread_ts)
    }

    /// Check whether the file with this resolved path was already ingested.
    #[must_use]
    pub fn is_loaded(&self, resolved: &str) -> bool {
        self.loaded_files.contains(resolved)
    }

    /// Number of ingested files.
    #[must_use]
    pub fn loaded_file_count(&self) -> usize {
        self.loaded_files.len()
    }

    /// Total number of bucketed messages.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.months.values().map(Vec::len).sum()
    }

    pub(super) fn add_to_thread(&mut self, message: Message) {
        let thread = self.threads.entry(message.thread_ts.clone()).or_default();
        if message.is_root_of_thread() {
            thread.set_root(message);
        } else {
            thread.push_reply(message);
        }
    }

    pub(super) fn append_batch(&mut self, key: MonthKey, batch: Vec<Message>) {
        if batch.is_empty() {
            return;
        }
        self.months.entry(key).or_default().extend(batch);
    }

    /// Stable-sort every bucket by timestamp and recompute trail flags.
    pub(super) fn resort(&mut self) {
        for bucket in self.months.values_mut() {
            bucket.sort_by(|a, b| a.ts.cmp(&b.ts));
            mark_trails(bucket);
        }
    }

    pub(super) fn mark_loaded(&mut self, resolved: String) {
        self.loaded_files.insert(resolved);
    }
}

/// A message is a trail when the one right before it has the same author.
fn mark_trails(bucket: &mut [Message]) {
    for i in 0..bucket.len() {
        let trail = i > 0 && bucket[i - 1].user == bucket[i].user;
        bucket[i].trail = trail;
    }
}
