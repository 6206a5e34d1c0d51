//! Log source backed by a zip archive.
//!
//! Lookups go through the central directory, so unlike tar no entry payload
//! is decompressed except the one being opened.

use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};
use zip::result::ZipError;
use zip::ZipArchive;

use super::path::{marker_prefix, normalize_entry_name, strip_root_prefix};
use super::{
    check_regular_file, clean_logical_path, DirListing, EntryReader, LogSource, LogSourceIter,
};
use crate::error::{Result, SlackLogError};

/// Log source over a zip archive.
#[derive(Debug, Clone)]
pub struct ZipSource {
    path: PathBuf,
    prefix: String,
}

impl ZipSource {
    /// Create a source for `path`, stripping `prefix` from every entry name.
    pub fn new(path: impl Into<PathBuf>, prefix: &str) -> Result<Self> {
        let path = path.into();
        check_regular_file(&path)?;
        Ok(Self {
            path,
            prefix: clean_logical_path(prefix),
        })
    }

    /// Create a source and detect its root prefix from the marker entry.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn detect(path: impl AsRef<Path>) -> Result<Self> {
        let mut source = Self::new(path.as_ref(), "")?;
        let archive = source.open_archive()?;
        let detected = archive
            .file_names()
            .find_map(|raw| marker_prefix(normalize_entry_name(raw)).map(str::to_string));

        match detected {
            Some(prefix) => {
                debug!(prefix = %prefix, "Detected archive root prefix");
                source.prefix = prefix;
                Ok(source)
            }
            None => Err(SlackLogError::PrefixNotDetected {
                path: source.path.clone(),
            }),
        }
    }

    /// Path of the archive file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Root prefix stripped from entry names.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn open_archive(&self) -> Result<ZipArchive<BufReader<File>>> {
        let file = File::open(&self.path).map_err(|e| {
            SlackLogError::io(format!("Failed to open {}", self.path.display()), e)
        })?;
        ZipArchive::new(BufReader::new(file)).map_err(|e| SlackLogError::ZipError {
            context: format!("Failed to read central directory of {}", self.path.display()),
            source: e,
        })
    }
}

impl LogSource for ZipSource {
    fn open(&self, name: &str) -> Result<EntryReader> {
        let wanted = clean_logical_path(name);
        let not_found = || SlackLogError::not_found(format!("{}:{wanted}", self.path.display()));

        let mut archive = self.open_archive()?;
        let raw_name = archive
            .file_names()
            .find(|raw| {
                !raw.ends_with('/')
                    && strip_root_prefix(&self.prefix, normalize_entry_name(raw))
                        == Some(wanted.as_str())
            })
            .map(str::to_string)
            .ok_or_else(not_found)?;

        let mut file = match archive.by_name(&raw_name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Err(not_found()),
            Err(e) => {
                return Err(SlackLogError::ZipError {
                    context: format!("Failed to open {raw_name} in {}", self.path.display()),
                    source: e,
                })
            }
        };
        let mut buf = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
        file.read_to_end(&mut buf).map_err(|e| {
            SlackLogError::io(format!("Failed to read {raw_name} from {}", self.path.display()), e)
        })?;
        Ok(Box::new(Cursor::new(buf)))
    }

    fn open_dir(&self, name: &str) -> Result<Box<dyn LogSourceIter>> {
        let archive = self.open_archive()?;
        let mut listing = DirListing::new(&self.prefix, name);
        for raw in archive.file_names() {
            listing.offer(normalize_entry_name(raw));
        }
        Ok(Box::new(listing.finish(&self.path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, content) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_detect_prefix() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("export.zip");
        write_zip(&path, &[("export/channels.json", "[]"), ("export/users.json", "[]")]);
        assert_eq!(ZipSource::detect(&path).unwrap().prefix(), "export");
    }

    #[test]
    fn test_detect_flat_archive() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("export.zip");
        write_zip(&path, &[("users.json", "[]")]);
        assert_eq!(ZipSource::detect(&path).unwrap().prefix(), "");
    }

    #[test]
    fn test_detect_without_marker_fails() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("export.zip");
        write_zip(&path, &[("export/channels.json", "[]")]);
        let err = ZipSource::detect(&path).unwrap_err();
        assert!(err.is_construction_error());
    }

    #[test]
    fn test_garbage_archive_is_zip_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("export.zip");
        std::fs::write(&path, b"not a zip").unwrap();
        let source = ZipSource::new(&path, "").unwrap();
        let err = source.open("users.json").err().unwrap();
        assert!(matches!(err, SlackLogError::ZipError { .. }));
    }
}
