//! Uniform read-only access to exported log bundles.
//!
//! A log bundle may be a plain directory tree or a compressed archive. Every
//! variant implements [`LogSource`], addressing entries by forward-slash
//! *logical paths* relative to the bundle root:
//! - [`DirSource`]: a directory on disk
//! - [`TarSource`]: a tar archive, raw or wrapped in gzip/bzip2
//! - [`ZipSource`]: a zip archive
//!
//! Archives usually wrap their content in a single top-level directory. The
//! [`open_log_source`] entry point detects that root prefix by locating the
//! `users.json` marker entry and strips it from every subsequent lookup.
//!
//! # Example
//!
//! ```rust,no_run
//! use slacklog::source::{open_log_source, read_dir_all};
//!
//! let source = open_log_source("slack-export.tar.gz")?;
//! let names = read_dir_all(source.open_dir("general")?)?;
//! println!("{} day files", names.len());
//! # Ok::<(), slacklog::SlackLogError>(())
//! ```

mod dir;
mod path;
mod tarball;
mod zipped;

pub use dir::DirSource;
pub use path::{base_name, clean_logical_path, join_logical};
pub use tarball::{Compression, TarSource};
pub use zipped::ZipSource;

use std::collections::VecDeque;
use std::fs;
use std::io::{BufReader, Read};
use std::path::Path;

use indexmap::IndexSet;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::error::{Result, SlackLogError};

/// Entry whose location identifies the bundle root inside an archive.
pub const MARKER_ENTRY: &str = "users.json";

/// Byte stream over one entry of a log source.
pub type EntryReader = Box<dyn Read>;

/// Read-only access to the entries of a log bundle.
pub trait LogSource {
    /// Open the named entry for reading.
    ///
    /// Fails with [`SlackLogError::NotFound`] when the entry is absent.
    fn open(&self, name: &str) -> Result<EntryReader>;

    /// Iterate the immediate children (files and subdirectories) of a directory.
    ///
    /// Fails with [`SlackLogError::NotFound`] when the directory is absent.
    fn open_dir(&self, name: &str) -> Result<Box<dyn LogSourceIter>>;
}

/// Forward-only iterator over directory entries.
///
/// Calling [`LogSource::open_dir`] again restarts the listing from scratch.
pub trait LogSourceIter {
    /// Advance to the next entry. Returns `false` once the listing is exhausted.
    fn next_entry(&mut self) -> Result<bool>;

    /// Logical path of the current entry, if positioned on one.
    fn name(&self) -> Option<&str>;

    /// Release the resources held by the iterator.
    ///
    /// Safe to call before the listing is exhausted and more than once.
    fn close(&mut self) -> Result<()>;
}

/// Open `path` as the matching log source variant.
///
/// Directories become a [`DirSource`]. Regular files ending in `.zip` become a
/// [`ZipSource`], anything else is opened as a [`TarSource`] (the extension
/// selects the decompressor). Archive sources are scanned for the
/// [`MARKER_ENTRY`] to determine the root prefix.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn open_log_source(path: impl AsRef<Path>) -> Result<Box<dyn LogSource>> {
    let path = path.as_ref();
    let metadata = fs::metadata(path).map_err(|e| SlackLogError::SourceUnavailable {
        path: path.to_path_buf(),
        source: e,
    })?;

    if metadata.is_dir() {
        debug!("Opening directory log source");
        return Ok(Box::new(DirSource::new(path)));
    }

    if has_extension(path, "zip") {
        return Ok(Box::new(ZipSource::detect(path)?));
    }
    Ok(Box::new(TarSource::detect(path)?))
}

/// Drain an iterator into a list of logical paths, then close it.
pub fn read_dir_all(mut iter: Box<dyn LogSourceIter>) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let drained = loop {
        match iter.next_entry() {
            Ok(true) => {
                if let Some(name) = iter.name().filter(|n| !n.is_empty()) {
                    names.push(name.to_string());
                }
            }
            Ok(false) => break Ok(()),
            Err(e) => break Err(e),
        }
    };
    let closed = iter.close();
    drained?;
    closed?;
    Ok(names)
}

/// Open an entry and decode it as JSON.
pub fn read_json<T: DeserializeOwned>(source: &dyn LogSource, name: &str) -> Result<T> {
    let reader = source.open(name)?;
    serde_json::from_reader(BufReader::new(reader)).map_err(|e| SlackLogError::ParseError {
        name: name.to_string(),
        source: e,
    })
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Check that an archive's backing file exists and is a regular file.
fn check_regular_file(path: &Path) -> Result<()> {
    let metadata = fs::metadata(path).map_err(|e| SlackLogError::SourceUnavailable {
        path: path.to_path_buf(),
        source: e,
    })?;
    if !metadata.is_file() {
        return Err(SlackLogError::NotRegularFile {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Collects the immediate children of one directory while archive entries
/// are offered in scan order.
#[derive(Debug)]
struct DirListing {
    prefix: String,
    dir: String,
    names: IndexSet<String>,
    seen: bool,
}

impl DirListing {
    fn new(prefix: &str, dir: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            dir: clean_logical_path(dir),
            names: IndexSet::new(),
            seen: false,
        }
    }

    fn offer(&mut self, entry: &str) {
        let Some(rel) = path::strip_root_prefix(&self.prefix, entry) else {
            return;
        };
        if path::is_within(&self.dir, rel) {
            self.seen = true;
        }
        if let Some(child) = path::immediate_child(&self.dir, rel) {
            self.names.insert(join_logical(&self.dir, child));
        }
    }

    fn finish(self, archive: &Path) -> Result<ListedDir> {
        if !self.seen && !self.dir.is_empty() {
            return Err(SlackLogError::not_found(format!(
                "{}:{}",
                archive.display(),
                self.dir
            )));
        }
        Ok(ListedDir::new(self.names.into_iter().collect()))
    }
}

/// Iterator over a listing that was gathered in one pass.
#[derive(Debug)]
struct ListedDir {
    pending: VecDeque<String>,
    current: Option<String>,
}

impl ListedDir {
    fn new(names: Vec<String>) -> Self {
        Self {
            pending: names.into(),
            current: None,
        }
    }
}

impl LogSourceIter for ListedDir {
    fn next_entry(&mut self) -> Result<bool> {
        self.current = self.pending.pop_front();
        Ok(self.current.is_some())
    }

    fn name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    fn close(&mut self) -> Result<()> {
        self.current = None;
        self.pending.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_listing_filters_nested_entries() {
        let mut listing = DirListing::new("export", "subdir");
        for entry in [
            "export/users.json",
            "export/subdir/",
            "export/subdir/data01.json",
            "export/subdir/subsubdir/",
            "export/subdir/subsubdir/deep.json",
            "other/subdir/stray.json",
        ] {
            listing.offer(entry);
        }
        let names = read_dir_all(Box::new(listing.finish(Path::new("a.tar")).unwrap())).unwrap();
        assert_eq!(names, vec!["subdir/data01.json", "subdir/subsubdir"]);
    }

    #[test]
    fn test_dir_listing_without_placeholders() {
        let mut listing = DirListing::new("export", "general");
        for entry in [
            "export/users.json",
            "export/general/2024-01-05.json",
            "export/general/archive/2023-11-01.json",
            "export/general/archive/deeper/x.json",
        ] {
            listing.offer(entry);
        }
        let names = read_dir_all(Box::new(listing.finish(Path::new("a.zip")).unwrap())).unwrap();
        assert_eq!(names, vec!["general/2024-01-05.json", "general/archive"]);
    }

    #[test]
    fn test_dir_listing_missing_directory() {
        let mut listing = DirListing::new("", "nothing");
        listing.offer("users.json");
        let err = listing.finish(Path::new("a.zip")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_listed_dir_close_early() {
        let mut iter = ListedDir::new(vec!["a".into(), "b".into()]);
        assert!(iter.next_entry().unwrap());
        assert_eq!(iter.name(), Some("a"));
        iter.close().unwrap();
        assert!(!iter.next_entry().unwrap());
        assert_eq!(iter.name(), None);
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension(Path::new("export.ZIP"), "zip"));
        assert!(!has_extension(Path::new("export.tar.gz"), "zip"));
    }
}
