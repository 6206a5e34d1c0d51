//! Incremental ingestion of per-day message files.
//!
//! A channel's messages are exported as one JSON array per day, named
//! `YYYY-MM-DD.json`. [`MessageIngestor`] reads those files through a
//! [`LogSource`] into a [`MessageTable`]:
//! - visible messages are bucketed by the month encoded in the file name,
//! - thread roots and replies are collected per thread timestamp,
//! - every bucket is kept sorted by timestamp with `trail` flags up to date,
//! - each file is ingested at most once.
//!
//! # Example
//!
//! ```rust,no_run
//! use slacklog::ingest::{MessageIngestor, MessageTable};
//! use slacklog::source::DirSource;
//!
//! let source = DirSource::new("slack-export");
//! let mut table = MessageTable::new();
//! let mut ingestor = MessageIngestor::new();
//! ingestor.read_log_dir(&mut table, &source, "general")?;
//!
//! for (month, messages) in table.months() {
//!     println!("{month}: {} messages", messages.len());
//! }
//! # Ok::<(), slacklog::SlackLogError>(())
//! ```

mod table;

pub use table::MessageTable;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument, trace, warn};

use crate::error::Result;
use crate::model::{Message, MonthKey, VISIBLE_SUBTYPES};
use crate::source::{
    base_name, clean_logical_path, read_dir_all, read_json, LogSource, LogSourceIter,
};

/// `{year}-{month}-{day}.json`
static DAY_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-\d{2}\.json$").expect("day file pattern is valid"));

/// Month key encoded in a day file name, or `None` if the name does not match.
#[must_use]
pub fn month_key_from_filename(name: &str) -> Option<MonthKey> {
    let caps = DAY_FILE.captures(base_name(name))?;
    MonthKey::parse(&caps[1], &caps[2]).ok()
}

/// Identity under which an ingested file is remembered.
#[must_use]
pub fn resolve_path(name: &str) -> String {
    format!("/{}", clean_logical_path(name))
}

/// Counters accumulated across ingestion calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Day files parsed and merged.
    pub files_ingested: usize,
    /// Calls that hit an already-ingested file.
    pub files_already_loaded: usize,
    /// Entries skipped because their name is not a day file.
    pub files_ignored: usize,
    /// Records decoded from day files.
    pub messages_read: usize,
    /// Records appended to month buckets.
    pub messages_bucketed: usize,
    /// Records attached to threads as root or reply.
    pub thread_messages: usize,
}

/// Reads day files into a [`MessageTable`].
#[derive(Debug, Default)]
pub struct MessageIngestor {
    stats: IngestStats,
}

impl MessageIngestor {
    /// Create an ingestor with empty statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get ingestion statistics.
    #[must_use]
    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    /// Ingest every day file directly under `dir`, in name order.
    ///
    /// Entries whose names are not day files are skipped with a warning.
    /// A malformed day file aborts the directory with its error.
    #[instrument(skip_all, fields(dir = %dir))]
    pub fn read_log_dir(
        &mut self,
        table: &mut MessageTable,
        source: &dyn LogSource,
        dir: &str,
    ) -> Result<()> {
        let iter = source.open_dir(dir)?;
        self.read_listing(table, source, iter)
    }

    /// Ingest the entries of an already opened directory listing, in name
    /// order.
    pub fn read_listing(
        &mut self,
        table: &mut MessageTable,
        source: &dyn LogSource,
        iter: Box<dyn LogSourceIter>,
    ) -> Result<()> {
        let mut names = read_dir_all(iter)?;
        names.sort();
        debug!(entries = names.len(), "Listed channel directory");

        for name in &names {
            self.read_log_file(table, source, name)?;
        }
        Ok(())
    }

    /// Ingest a single day file. Repeated calls for the same path do nothing.
    pub fn read_log_file(
        &mut self,
        table: &mut MessageTable,
        source: &dyn LogSource,
        path: &str,
    ) -> Result<()> {
        let resolved = resolve_path(path);
        if table.is_loaded(&resolved) {
            trace!(path = %resolved, "Already ingested, skipping");
            self.stats.files_already_loaded += 1;
            return Ok(());
        }

        let Some(key) = month_key_from_filename(&resolved) else {
            warn!(path = %resolved, "Skipping entry that is not a day file");
            self.stats.files_ignored += 1;
            return Ok(());
        };

        let records: Vec<Message> = read_json(source, path)?;
        self.stats.messages_read += records.len();

        let mut batch = Vec::new();
        for record in records {
            if !record.is_visible() {
                continue;
            }
            let bucketed = record.thread_ts.is_empty()
                || record.is_root_of_thread()
                || VISIBLE_SUBTYPES.contains(&record.subtype.as_str());

            if record.in_thread() {
                self.stats.thread_messages += 1;
                table.add_to_thread(record.clone());
            }
            if bucketed {
                batch.push(record);
            }
        }

        self.stats.messages_bucketed += batch.len();
        let added = batch.len();
        table.append_batch(key, batch);
        table.resort();
        table.mark_loaded(resolved);
        self.stats.files_ingested += 1;

        debug!(path = %path, month = %key, added, "Ingested day file");
        Ok(())
    }
}
