//! Message records as they appear in exported `YYYY-MM-DD.json` day files.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::null_as_default;

/// Subtypes that are shown alongside ordinary messages.
pub const VISIBLE_SUBTYPES: [&str; 3] = ["bot_message", "slackbot_response", "thread_broadcast"];

/// A single message record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Client-generated message id.
    #[serde(
        default,
        skip_serializing_if = "String::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub client_msg_id: String,
    /// Record type, normally `"message"`.
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub typ: String,
    /// Message subtype; empty for ordinary user messages.
    #[serde(
        default,
        skip_serializing_if = "String::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub subtype: String,
    /// Message text in Slack markup.
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    /// Author user id.
    #[serde(default, deserialize_with = "null_as_default")]
    pub user: String,
    /// Timestamp, `"seconds.microseconds"` with fixed field widths.
    #[serde(default, deserialize_with = "null_as_default")]
    pub ts: String,
    /// Timestamp of the thread root this message belongs to.
    #[serde(
        default,
        skip_serializing_if = "String::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub thread_ts: String,
    /// Author of the thread root.
    #[serde(
        default,
        skip_serializing_if = "String::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub parent_user_id: String,
    /// Display name for bot messages.
    #[serde(
        default,
        skip_serializing_if = "String::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub username: String,
    /// Bot id for bot messages.
    #[serde(
        default,
        skip_serializing_if = "String::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub bot_id: String,
    /// Workspace id.
    #[serde(
        default,
        skip_serializing_if = "String::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub team: String,
    /// Workspace id of the author.
    #[serde(
        default,
        skip_serializing_if = "String::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub user_team: String,
    /// Workspace id the message originated from.
    #[serde(
        default,
        skip_serializing_if = "String::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub source_team: String,
    /// Author profile snapshot embedded by the exporter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_profile: Option<MessageUserProfile>,
    /// Link unfurls and bot attachments.
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub attachments: Vec<MessageAttachment>,
    /// Rich text blocks, kept as raw JSON.
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub blocks: Vec<Value>,
    /// Emoji reactions.
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub reactions: Vec<MessageReaction>,
    /// Present when the message was edited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited: Option<MessageEdited>,
    /// Bot icons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icons: Option<MessageIcons>,
    /// Uploaded files.
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub files: Vec<MessageFile>,
    /// Thread root copied into `thread_broadcast` messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<Box<Message>>,
    /// Whether the message is rendered as posted by a bot.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub display_as_bot: bool,
    /// Whether the message is a file upload.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub upload: bool,
    /// Set when the previous message in the same month bucket has the same
    /// author. Derived during ingestion.
    #[serde(skip)]
    pub trail: bool,
}

impl Message {
    /// Whether the message belongs in month buckets.
    ///
    /// Join/leave notices and similar housekeeping subtypes are hidden.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.subtype.is_empty() || VISIBLE_SUBTYPES.contains(&self.subtype.as_str())
    }

    /// Whether this message starts a thread.
    #[must_use]
    pub fn is_root_of_thread(&self) -> bool {
        !self.thread_ts.is_empty() && self.ts == self.thread_ts
    }

    /// Whether the message is part of a thread (root or reply).
    #[must_use]
    pub fn in_thread(&self) -> bool {
        !self.thread_ts.is_empty()
    }

    /// Posting time derived from [`Message::ts`].
    #[must_use]
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        ts_to_datetime(&self.ts)
    }

    /// Strip access tokens that exporters append to private file URLs.
    pub fn remove_token_from_urls(&mut self) {
        for file in &mut self.files {
            file.remove_token_from_urls();
        }
    }
}

/// Convert a `"seconds.microseconds"` timestamp to a UTC time.
///
/// Parsed as integers so no precision is lost.
#[must_use]
pub fn ts_to_datetime(ts: &str) -> Option<DateTime<Utc>> {
    let (secs, frac) = ts.split_once('.').unwrap_or((ts, ""));
    let secs: i64 = secs.parse().ok()?;
    let nanos = if frac.is_empty() {
        0
    } else {
        if frac.len() > 9 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let digits: u32 = frac.parse().ok()?;
        digits * 10u32.pow(9 - frac.len() as u32)
    };
    DateTime::from_timestamp(secs, nanos)
}

static TOKEN_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\?t=xoxe-[-a-f0-9]+$").expect("token pattern is valid"));

/// Characters escaped when a file name is used as one URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'|')
    .add(b'\\')
    .add(b'^')
    .add(b'[')
    .add(b']');

/// An uploaded file attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct MessageFile {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    pub created: i64,
    pub timestamp: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub mimetype: String,
    #[serde(deserialize_with = "null_as_default")]
    pub filetype: String,
    #[serde(deserialize_with = "null_as_default")]
    pub pretty_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub user: String,
    pub editable: bool,
    pub size: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub mode: String,
    pub is_external: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub external_type: String,
    pub is_public: bool,
    pub public_url_shared: bool,
    pub display_as_bot: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url_private: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url_private_download: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub thumb_64: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub thumb_80: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub thumb_160: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub thumb_360: String,
    pub thumb_360_w: i64,
    pub thumb_360_h: i64,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub thumb_480: String,
    pub thumb_480_w: i64,
    pub thumb_480_h: i64,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub thumb_720: String,
    pub thumb_720_w: i64,
    pub thumb_720_h: i64,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub thumb_800: String,
    pub thumb_800_w: i64,
    pub thumb_800_h: i64,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub thumb_960: String,
    pub thumb_960_w: i64,
    pub thumb_960_h: i64,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub thumb_1024: String,
    pub thumb_1024_w: i64,
    pub thumb_1024_h: i64,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub thumb_360_gif: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub thumb_480_gif: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub deanimate_gif: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub thumb_tiny: String,
    pub original_w: i64,
    pub original_h: i64,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub thumb_video: String,
    #[serde(deserialize_with = "null_as_default")]
    pub permalink: String,
    #[serde(deserialize_with = "null_as_default")]
    pub permalink_public: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub edit_link: String,
    pub is_starred: bool,
    pub has_rich_preview: bool,
}

impl MessageFile {
    /// Top-level MIME type (`"image"` for `"image/png"`), empty if malformed.
    #[must_use]
    pub fn top_level_mimetype(&self) -> &str {
        self.mimetype.split_once('/').map_or("", |(top, _)| top)
    }

    /// Download URLs paired with the filename suffix used when saving them.
    #[must_use]
    pub fn download_urls_and_suffixes(&self) -> Vec<(&str, &'static str)> {
        [
            (self.url_private.as_str(), ""),
            (self.thumb_64.as_str(), "_64"),
            (self.thumb_80.as_str(), "_80"),
            (self.thumb_160.as_str(), "_160"),
            (self.thumb_360.as_str(), "_360"),
            (self.thumb_480.as_str(), "_480"),
            (self.thumb_720.as_str(), "_720"),
            (self.thumb_800.as_str(), "_800"),
            (self.thumb_960.as_str(), "_960"),
            (self.thumb_1024.as_str(), "_1024"),
            (self.thumb_360_gif.as_str(), "_360"),
            (self.thumb_480_gif.as_str(), "_480"),
            (self.deanimate_gif.as_str(), "_deanimate_gif"),
            (self.thumb_video.as_str(), "_thumb_video"),
        ]
        .into_iter()
        .filter(|(url, _)| !url.is_empty())
        .collect()
    }

    fn suffix_for(&self, url: &str) -> &'static str {
        self.download_urls_and_suffixes()
            .into_iter()
            .find(|(u, _)| *u == url)
            .map_or("", |(_, suffix)| suffix)
    }

    /// Local filename for a downloaded copy of `url`.
    ///
    /// Names starting with `_` or `.` are prefixed with `files` so static site
    /// generators publish them.
    #[must_use]
    pub fn download_filename(&self, url: &str, suffix: &str) -> String {
        let url_ext = extension_of(url);
        let name_ext = extension_of(&self.name);
        let ext = if !url_ext.is_empty() {
            url_ext
        } else if !name_ext.is_empty() {
            name_ext
        } else {
            filetype_extension(&self.filetype)
        };
        let stem = self.name.strip_suffix(ext).unwrap_or(&self.name);

        let filename = format!("{stem}{suffix}{ext}").replace('/', "_");
        if filename.starts_with('_') || filename.starts_with('.') {
            format!("files{filename}")
        } else {
            filename
        }
    }

    fn download_path(&self, url: &str) -> String {
        let filename = self.download_filename(url, self.suffix_for(url));
        format!("{}/{}", self.id, utf8_percent_encode(&filename, PATH_SEGMENT))
    }

    /// Relative path of the original file.
    #[must_use]
    pub fn original_file_path(&self) -> String {
        self.download_path(&self.url_private)
    }

    /// Relative path of the largest thumbnail, or the original if none.
    #[must_use]
    pub fn thumb_image_path(&self) -> String {
        if self.thumb_1024.is_empty() {
            self.original_file_path()
        } else {
            self.download_path(&self.thumb_1024)
        }
    }

    /// Width matching [`MessageFile::thumb_image_path`].
    #[must_use]
    pub fn thumb_image_width(&self) -> i64 {
        if self.thumb_1024.is_empty() {
            self.original_w
        } else {
            self.thumb_1024_w
        }
    }

    /// Height matching [`MessageFile::thumb_image_path`].
    #[must_use]
    pub fn thumb_image_height(&self) -> i64 {
        if self.thumb_1024.is_empty() {
            self.original_h
        } else {
            self.thumb_1024_h
        }
    }

    /// Relative path of the video thumbnail.
    #[must_use]
    pub fn thumb_video_path(&self) -> String {
        self.download_path(&self.thumb_video)
    }

    /// Strip access tokens from every URL of this file.
    pub fn remove_token_from_urls(&mut self) {
        for url in [
            &mut self.url_private,
            &mut self.url_private_download,
            &mut self.thumb_64,
            &mut self.thumb_80,
            &mut self.thumb_160,
            &mut self.thumb_360,
            &mut self.thumb_480,
            &mut self.thumb_720,
            &mut self.thumb_800,
            &mut self.thumb_960,
            &mut self.thumb_1024,
            &mut self.thumb_360_gif,
            &mut self.thumb_480_gif,
            &mut self.deanimate_gif,
            &mut self.thumb_video,
        ] {
            let stripped = TOKEN_SUFFIX.replace(url.as_str(), "").into_owned();
            *url = stripped;
        }
    }
}

/// Extension of the last path segment including the dot, or `""`.
fn extension_of(name: &str) -> &str {
    let segment_start = name.rfind('/').map_or(0, |i| i + 1);
    match name[segment_start..].rfind('.') {
        Some(dot) => &name[segment_start + dot..],
        None => "",
    }
}

fn filetype_extension(filetype: &str) -> &'static str {
    match filetype {
        "png" => ".png",
        "jpg" | "jpeg" => ".jpg",
        "gif" => ".gif",
        "pdf" => ".pdf",
        "mp4" => ".mp4",
        "mov" => ".mov",
        "text" => ".txt",
        "markdown" => ".md",
        "zip" => ".zip",
        _ => "",
    }
}

/// Bot icons.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageIcons {
    /// 48px icon URL.
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_48: String,
}

/// Edit marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageEdited {
    /// Editing user id.
    #[serde(default, deserialize_with = "null_as_default")]
    pub user: String,
    /// Edit timestamp.
    #[serde(default, deserialize_with = "null_as_default")]
    pub ts: String,
}

/// Author profile snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct MessageUserProfile {
    #[serde(deserialize_with = "null_as_default")]
    pub avatar_hash: String,
    #[serde(deserialize_with = "null_as_default")]
    pub image_72: String,
    #[serde(deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub real_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub team: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    pub is_restricted: bool,
    pub is_ultra_restricted: bool,
}

/// Link unfurl or bot attachment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct MessageAttachment {
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub service_name: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub author_icon: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub author_name: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub author_subname: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub title_link: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub fallback: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub thumb_url: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub from_url: String,
    pub thumb_width: i64,
    pub thumb_height: i64,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub service_icon: String,
    pub id: i64,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub original_url: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub video_html: String,
    pub video_html_width: i64,
    pub video_html_height: i64,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub footer: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "null_as_default")]
    pub footer_icon: String,
}

/// Emoji reaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageReaction {
    /// Emoji name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Reacting user ids.
    #[serde(default, deserialize_with = "null_as_default")]
    pub users: Vec<String>,
    /// Number of reactions.
    #[serde(default)]
    pub count: u64,
}
