//! Log source backed by a tar archive.
//!
//! Tar streams (and their gzip/bzip2 wrappers) only support sequential
//! reads, so every [`LogSource::open`] and [`LogSource::open_dir`] call
//! reopens the file and scans headers from the start.

use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

use bzip2::read::MultiBzDecoder;
use flate2::read::MultiGzDecoder;
use tracing::{debug, instrument, trace};

use super::path::{marker_prefix, normalize_entry_name, strip_root_prefix};
use super::{
    check_regular_file, clean_logical_path, DirListing, EntryReader, LogSource, LogSourceIter,
};
use crate::error::{Result, SlackLogError};

/// Compression wrapping a tar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Plain `.tar`.
    None,
    /// `.gz`
    Gzip,
    /// `.bz2`
    Bzip2,
}

impl Compression {
    /// Select the compression from the archive's file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("tar") => Ok(Self::None),
            Some("gz") => Ok(Self::Gzip),
            Some("bz2") => Ok(Self::Bzip2),
            _ => Err(SlackLogError::UnsupportedCompression {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Log source over a (possibly compressed) tar archive.
#[derive(Debug, Clone)]
pub struct TarSource {
    path: PathBuf,
    compression: Compression,
    prefix: String,
}

impl TarSource {
    /// Create a source for `path`, stripping `prefix` from every entry name.
    ///
    /// An empty prefix means entries are addressed by their full names.
    pub fn new(path: impl Into<PathBuf>, prefix: &str) -> Result<Self> {
        let path = path.into();
        let compression = Compression::from_path(&path)?;
        check_regular_file(&path)?;
        Ok(Self {
            path,
            compression,
            prefix: clean_logical_path(prefix),
        })
    }

    /// Create a source and detect its root prefix from the marker entry.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn detect(path: impl AsRef<Path>) -> Result<Self> {
        let mut source = Self::new(path.as_ref(), "")?;
        let mut detected = None;
        source.scan(|name, _| {
            if let Some(prefix) = marker_prefix(name) {
                detected = Some(prefix.to_string());
                return Ok(true);
            }
            Ok(false)
        })?;

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

    /// Compression wrapping the tar stream.
    #[must_use]
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Open the backing file with the matching decompressor.
    fn open_stream(&self) -> Result<Box<dyn Read>> {
        let file = File::open(&self.path).map_err(|e| {
            SlackLogError::io(format!("Failed to open {}", self.path.display()), e)
        })?;
        let reader = BufReader::new(file);
        Ok(match self.compression {
            Compression::None => Box::new(reader),
            Compression::Gzip => Box::new(MultiGzDecoder::new(reader)),
            Compression::Bzip2 => Box::new(MultiBzDecoder::new(reader)),
        })
    }

    /// Walk the archive headers in order, handing each normalized entry name
    /// to `visit` until it returns `true`.
    ///
    /// Returns whether the visitor stopped the scan early. The stream is
    /// dropped before returning on every path.
    fn scan<F>(&self, mut visit: F) -> Result<bool>
    where
        F: FnMut(&str, &mut tar::Entry<'_, Box<dyn Read>>) -> Result<bool>,
    {
        let read_err = |e: std::io::Error| {
            SlackLogError::io(format!("Failed to read tar {}", self.path.display()), e)
        };
        let mut archive = tar::Archive::new(self.open_stream()?);
        for entry in archive.entries().map_err(read_err)? {
            let mut entry = entry.map_err(read_err)?;
            let raw = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
            let name = normalize_entry_name(&raw);
            trace!(entry = name, "Scanning tar entry");
            if visit(name, &mut entry)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl LogSource for TarSource {
    fn open(&self, name: &str) -> Result<EntryReader> {
        let wanted = clean_logical_path(name);
        let mut payload = None;
        self.scan(|entry_name, entry| {
            if entry.header().entry_type().is_dir()
                || strip_root_prefix(&self.prefix, entry_name) != Some(wanted.as_str())
            {
                return Ok(false);
            }
            let mut buf = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
            entry.read_to_end(&mut buf).map_err(|e| {
                let context = format!("Failed to read {wanted} from {}", self.path.display());
                SlackLogError::io(context, e)
            })?;
            payload = Some(buf);
            Ok(true)
        })?;

        match payload {
            Some(buf) => Ok(Box::new(Cursor::new(buf))),
            None => Err(SlackLogError::not_found(format!(
                "{}:{wanted}",
                self.path.display()
            ))),
        }
    }

    fn open_dir(&self, name: &str) -> Result<Box<dyn LogSourceIter>> {
        let mut listing = DirListing::new(&self.prefix, name);
        self.scan(|entry_name, _| {
            listing.offer(entry_name);
            Ok(false)
        })?;
        Ok(Box::new(listing.finish(&self.path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_tar(path: &Path, entries: &[(&str, &str)]) {
        let mut builder = tar::Builder::new(File::create(path).unwrap());
        for (name, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            builder.append_data(&mut header, name, content.as_bytes()).unwrap();
        }
        builder.finish().unwrap();
    }

    #[test]
    fn test_compression_from_extension() {
        assert_eq!(Compression::from_path(Path::new("a.tar")).unwrap(), Compression::None);
        assert_eq!(Compression::from_path(Path::new("a.tar.gz")).unwrap(), Compression::Gzip);
        assert_eq!(Compression::from_path(Path::new("a.tar.BZ2")).unwrap(), Compression::Bzip2);
        let err = Compression::from_path(Path::new("a.tar.xz")).unwrap_err();
        assert!(err.is_construction_error());
    }

    #[test]
    fn test_new_rejects_missing_and_directories() {
        let temp = tempdir().unwrap();
        let err = TarSource::new(temp.path().join("absent.tar"), "").unwrap_err();
        assert!(matches!(err, SlackLogError::SourceUnavailable { .. }));

        let dir = temp.path().join("looks_like.tar");
        std::fs::create_dir(&dir).unwrap();
        let err = TarSource::new(&dir, "").unwrap_err();
        assert!(matches!(err, SlackLogError::NotRegularFile { .. }));
    }

    #[test]
    fn test_detect_prefix() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("export.tar");
        write_tar(
            &path,
            &[("slack export/channels.json", "[]"), ("slack export/users.json", "[]")],
        );
        let source = TarSource::detect(&path).unwrap();
        assert_eq!(source.prefix(), "slack export");
    }

    #[test]
    fn test_detect_without_marker_fails() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("export.tar");
        write_tar(&path, &[("export/channels.json", "[]")]);
        let err = TarSource::detect(&path).unwrap_err();
        assert!(matches!(err, SlackLogError::PrefixNotDetected { .. }));
    }

    #[test]
    fn test_open_strips_prefix() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("export.tar");
        write_tar(&path, &[("export/users.json", "[1]"), ("export/general/a.json", "[2]")]);

        let source = TarSource::new(&path, "export").unwrap();
        let mut content = String::new();
        source.open("general/a.json").unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "[2]");
        assert!(source.open("export/general/a.json").err().unwrap().is_not_found());
    }

    fn tar_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            builder.append_data(&mut header, name, content.as_bytes()).unwrap();
        }
        builder.into_inner().unwrap()
    }

    #[test]
    fn test_gzip_with_several_members() {
        use flate2::write::GzEncoder;
        use std::io::Write;

        let raw = tar_bytes(&[
            ("export/users.json", "[]"),
            ("export/general/2024-01-05.json", "[]"),
            ("export/data.json", "{\"late\":true}"),
        ]);
        // Split mid-stream so the last entry lives only in the second member.
        let (head, tail) = raw.split_at(1024);

        let temp = tempdir().unwrap();
        let path = temp.path().join("export.tar.gz");
        let mut file = File::create(&path).unwrap();
        for part in [head, tail] {
            let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(part).unwrap();
            file.write_all(&encoder.finish().unwrap()).unwrap();
        }
        drop(file);

        let source = TarSource::detect(&path).unwrap();
        let mut content = String::new();
        source.open("data.json").unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "{\"late\":true}");
    }

    #[test]
    fn test_open_skips_directory_entry_with_requested_name() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("export.tar");
        let mut builder = tar::Builder::new(File::create(&path).unwrap());
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Directory);
        header.set_size(0);
        header.set_mode(0o755);
        builder
            .append_data(&mut header, "export/general", std::io::empty())
            .unwrap();
        let mut header = tar::Header::new_gnu();
        header.set_size(2);
        header.set_mode(0o644);
        builder
            .append_data(&mut header, "export/users.json", &b"[]"[..])
            .unwrap();
        builder.finish().unwrap();
        drop(builder);

        let source = TarSource::detect(&path).unwrap();
        assert!(source.open("general").err().unwrap().is_not_found());
    }
}
