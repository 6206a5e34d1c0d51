//! Synthetic export bundle generators.
//!
//! Builds the same logical file tree as a plain directory or as a tar, gzip
//! tar, bzip2 tar or zip archive, so tests can compare source variants over
//! identical content.

#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;

/// Wrapping directory used inside generated archives.
pub const ARCHIVE_ROOT: &str = "export";

/// Backing format of a generated bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Dir,
    Tar,
    TarGz,
    TarBz2,
    Zip,
}

impl Format {
    fn file_name(self) -> &'static str {
        match self {
            Self::Dir => "bundle",
            Self::Tar => "bundle.tar",
            Self::TarGz => "bundle.tar.gz",
            Self::TarBz2 => "bundle.tar.bz2",
            Self::Zip => "bundle.zip",
        }
    }
}

/// A logical file tree to materialise in any [`Format`].
#[derive(Debug, Clone, Default)]
pub struct BundleBuilder {
    files: Vec<(String, Vec<u8>)>,
    skip_directory_entries: bool,
    dot_slash: bool,
    bare_directory_names: bool,
}

impl BundleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file at a logical path.
    pub fn file(mut self, path: &str, content: impl AsRef<[u8]>) -> Self {
        self.files.push((path.to_string(), content.as_ref().to_vec()));
        self
    }

    /// Leave out archive directory entries; directories exist only through
    /// the files beneath them.
    pub fn without_directory_entries(mut self) -> Self {
        self.skip_directory_entries = true;
        self
    }

    /// Prefix every archive entry name with `./`, as `tar -C dir .` does.
    pub fn dot_slash_names(mut self) -> Self {
        self.dot_slash = true;
        self
    }

    /// Write tar directory entries without the trailing slash.
    pub fn bare_directory_names(mut self) -> Self {
        self.bare_directory_names = true;
        self
    }

    /// A small workspace export: two channels, two users, an emoji map, a
    /// stray non-day file and a nested directory.
    pub fn workspace() -> Self {
        Self::new()
            .file(
                "channels.json",
                r#"[{"id":"C02","name":"random"},{"id":"C01","name":"general"}]"#,
            )
            .file(
                "users.json",
                r#"[{"id":"U01","name":"ann","profile":{"real_name":"Ann Example",
                    "display_name":"ann"}},
                    {"id":"U02","name":"bob","profile":{"display_name":"bobby","bot_id":"B02"}}]"#,
            )
            .file("emojis.json", r#"{"shipit":"https://emoji.example/shipit.png"}"#)
            .file("data.json", r#"{"payload":[1,2,3]}"#)
            .file(
                "general/2024-01-20.json",
                r#"[
                    {"type":"message","user":"U02","text":"later","ts":"1705708800.000100"},
                    {"type":"message","user":"U02","text":"again","ts":"1705708860.000100"}
                ]"#,
            )
            .file(
                "general/2024-01-05.json",
                r#"[
                    {"type":"message","user":"U01","text":"kickoff","ts":"1704412800.000100",
                        "thread_ts":"1704412800.000100","reply_count":2},
                    {"type":"message","user":"U02","text":"first reply","ts":"1704412860.000100",
                        "thread_ts":"1704412800.000100","parent_user_id":"U01"},
                    {"type":"message","subtype":"thread_broadcast","user":"U01","text":"broadcast",
                        "ts":"1704412920.000100","thread_ts":"1704412800.000100"},
                    {"type":"message","subtype":"channel_join","user":"U02",
                        "text":"<@U02> has joined","ts":"1704412700.000100"}
                ]"#,
            )
            .file(
                "general/2023-12-31.json",
                r#"[{"type":"message","subtype":"bot_message","bot_id":"B02","username":"deploy",
                    "text":"deployed","ts":"1704038400.000100"}]"#,
            )
            .file("general/notes.txt", "not a day file")
            .file("general/archive/2023-11-01.json", "[]")
            .file(
                "random/2024-03-01.json",
                r#"[{"type":"message","user":"U01","text":"hello","ts":"1709251200.000100"}]"#,
            )
    }

    /// Write the tree under `dir` in `format` and return the bundle path.
    pub fn write(&self, dir: &Path, format: Format) -> PathBuf {
        let path = dir.join(format.file_name());
        match format {
            Format::Dir => self.write_dir(&path),
            Format::Tar => {
                let file = File::create(&path).unwrap();
                self.write_tar(file).into_inner().unwrap();
            }
            Format::TarGz => {
                let file = File::create(&path).unwrap();
                let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
                self.write_tar(encoder).into_inner().unwrap().finish().unwrap();
            }
            Format::TarBz2 => {
                let file = File::create(&path).unwrap();
                let encoder = bzip2::write::BzEncoder::new(file, bzip2::Compression::default());
                self.write_tar(encoder).into_inner().unwrap().finish().unwrap();
            }
            Format::Zip => self.write_zip(&path),
        }
        path
    }

    fn write_dir(&self, root: &Path) {
        for (name, content) in &self.files {
            let target = root.join(name);
            fs::create_dir_all(target.parent().unwrap()).unwrap();
            fs::write(target, content).unwrap();
        }
    }

    /// Directory entries implied by the file list, parents first.
    fn directories(&self) -> Vec<String> {
        let mut dirs: Vec<String> = Vec::new();
        for (name, _) in &self.files {
            let parts: Vec<&str> = name.split('/').collect();
            for depth in 1..parts.len() {
                let dir = parts[..depth].join("/");
                if !dirs.contains(&dir) {
                    dirs.push(dir);
                }
            }
        }
        dirs
    }

    /// Archive entry name for a logical path below the wrapping directory.
    fn entry_name(&self, logical: &str) -> String {
        let lead = if self.dot_slash { "./" } else { "" };
        if logical.is_empty() {
            format!("{lead}{ARCHIVE_ROOT}")
        } else {
            format!("{lead}{ARCHIVE_ROOT}/{logical}")
        }
    }

    /// Archive directories to emit, wrapping directory first.
    fn directory_entries(&self) -> Vec<String> {
        if self.skip_directory_entries {
            return Vec::new();
        }
        let mut dirs = vec![String::new()];
        dirs.extend(self.directories());
        dirs
    }

    fn write_tar<W: Write>(&self, writer: W) -> tar::Builder<W> {
        let mut builder = tar::Builder::new(writer);

        for dir in self.directory_entries() {
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(tar::EntryType::Directory);
            header.set_size(0);
            header.set_mode(0o755);
            let mut name = self.entry_name(&dir);
            if !self.bare_directory_names {
                name.push('/');
            }
            append_raw(&mut builder, &mut header, &name, std::io::empty());
        }

        for (name, content) in &self.files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            append_raw(&mut builder, &mut header, &self.entry_name(name), content.as_slice());
        }
        builder.finish().unwrap();
        builder
    }

    fn write_zip(&self, path: &Path) {
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        let options = SimpleFileOptions::default();

        for dir in self.directory_entries() {
            writer.add_directory(format!("{}/", self.entry_name(&dir)), options).unwrap();
        }
        for (name, content) in &self.files {
            writer.start_file(self.entry_name(name), options).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap();
    }
}

/// Append an entry under its exact name.
///
/// `Builder::append_data` normalises paths and would drop a leading `./`,
/// so the name bytes go into the header directly.
fn append_raw<W: Write, R: std::io::Read>(
    builder: &mut tar::Builder<W>,
    header: &mut tar::Header,
    name: &str,
    data: R,
) {
    let field = &mut header.as_old_mut().name;
    assert!(name.len() < field.len(), "entry name too long: {name}");
    field.fill(0);
    field[..name.len()].copy_from_slice(name.as_bytes());
    header.set_cksum();
    builder.append(header, data).unwrap();
}
