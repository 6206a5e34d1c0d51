//! Channel records from `channels.json`.

use serde::{Deserialize, Serialize};

use super::null_as_default;

/// A channel of the exported workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Channel {
    /// Channel id.
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    /// Channel name; also the name of its message directory.
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// Creation time (unix seconds).
    pub created: i64,
    /// Creator user id.
    #[serde(deserialize_with = "null_as_default")]
    pub creator: String,
    /// Whether the channel is archived.
    pub is_archived: bool,
    /// Whether this is the workspace's general channel.
    pub is_general: bool,
    /// Member user ids.
    #[serde(deserialize_with = "null_as_default")]
    pub members: Vec<String>,
    /// Pinned items.
    #[serde(deserialize_with = "null_as_default")]
    pub pins: Vec<ChannelPin>,
    /// Channel topic.
    pub topic: ChannelText,
    /// Channel purpose.
    pub purpose: ChannelText,
}

/// A pinned item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct ChannelPin {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub typ: String,
    pub created: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub user: String,
    #[serde(deserialize_with = "null_as_default")]
    pub owner: String,
}

/// Topic or purpose text with its author.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct ChannelText {
    #[serde(deserialize_with = "null_as_default")]
    pub value: String,
    #[serde(deserialize_with = "null_as_default")]
    pub creator: String,
    pub last_set: i64,
}
