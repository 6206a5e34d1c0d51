//! Log source backed by a plain directory tree.

use std::fs::{self, File, ReadDir};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::trace;

use super::{clean_logical_path, join_logical, EntryReader, LogSource, LogSourceIter};
use crate::error::{Result, SlackLogError};

/// Log source over a directory on disk.
#[derive(Debug, Clone)]
pub struct DirSource {
    base: PathBuf,
}

impl DirSource {
    /// Create a source rooted at `base`.
    #[must_use]
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Root directory of this source.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn resolve(&self, logical: &str) -> PathBuf {
        if logical.is_empty() {
            self.base.clone()
        } else {
            self.base.join(logical)
        }
    }
}

impl LogSource for DirSource {
    fn open(&self, name: &str) -> Result<EntryReader> {
        let logical = clean_logical_path(name);
        let path = self.resolve(&logical);
        trace!(path = %path.display(), "Opening file");
        let file = File::open(&path).map_err(|e| SlackLogError::from_io(&logical, e))?;
        let metadata = file
            .metadata()
            .map_err(|e| SlackLogError::io(format!("Failed to stat {}", path.display()), e))?;
        // archives never yield a payload for a directory entry either
        if metadata.is_dir() {
            return Err(SlackLogError::not_found(logical));
        }
        Ok(Box::new(BufReader::new(file)))
    }

    fn open_dir(&self, name: &str) -> Result<Box<dyn LogSourceIter>> {
        let logical = clean_logical_path(name);
        let path = self.resolve(&logical);
        let metadata = fs::metadata(&path).map_err(|e| SlackLogError::from_io(&logical, e))?;
        if !metadata.is_dir() {
            return Err(SlackLogError::NotADirectory { path });
        }
        let entries = fs::read_dir(&path).map_err(|e| {
            SlackLogError::io(format!("Failed to read directory {}", path.display()), e)
        })?;
        Ok(Box::new(DirSourceIter {
            dir: logical,
            entries: Some(entries),
            current: None,
        }))
    }
}

/// Streams entries straight from the directory handle; both files and
/// subdirectories are reported.
#[derive(Debug)]
struct DirSourceIter {
    dir: String,
    entries: Option<ReadDir>,
    current: Option<String>,
}

impl LogSourceIter for DirSourceIter {
    fn next_entry(&mut self) -> Result<bool> {
        self.current = None;
        let Some(entries) = self.entries.as_mut() else {
            return Ok(false);
        };
        match entries.next() {
            None => Ok(false),
            Some(Err(e)) => Err(SlackLogError::io(
                format!("Failed to read entry of {}", self.dir),
                e,
            )),
            Some(Ok(entry)) => {
                let file_name = entry.file_name();
                self.current = Some(join_logical(&self.dir, &file_name.to_string_lossy()));
                Ok(true)
            }
        }
    }

    fn name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    fn close(&mut self) -> Result<()> {
        self.current = None;
        self.entries = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::read_dir_all;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn test_open_reads_file() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("general")).unwrap();
        fs::write(temp.path().join("general/2024-01-05.json"), "[]").unwrap();

        let source = DirSource::new(temp.path());
        let mut content = String::new();
        source
            .open("general/2024-01-05.json")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "[]");
    }

    #[test]
    fn test_open_missing_is_not_found() {
        let temp = tempdir().unwrap();
        let source = DirSource::new(temp.path());
        let err = source.open("never_exist").err().unwrap();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_open_dir_on_file_fails() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("users.json"), "[]").unwrap();
        let source = DirSource::new(temp.path());
        let err = source.open_dir("users.json").err().unwrap();
        assert!(matches!(err, SlackLogError::NotADirectory { .. }));
        assert!(source.open_dir("absent").err().unwrap().is_not_found());
    }

    #[test]
    fn test_open_dir_root_lists_top_level() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("users.json"), "[]").unwrap();
        fs::create_dir(temp.path().join("general")).unwrap();
        fs::write(temp.path().join("general/2024-01-05.json"), "[]").unwrap();

        let source = DirSource::new(temp.path());
        let mut names = read_dir_all(source.open_dir("").unwrap()).unwrap();
        names.sort();
        assert_eq!(names, vec!["general", "users.json"]);
    }
}
