//! Side tables decoded from the top level of a log bundle.
//!
//! - [`ChannelTable`] from `channels.json`, filtered by an allow-list
//! - [`UserTable`] from `users.json`
//! - [`EmojiTable`] from the optional emoji map

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::Result;
use crate::model::{Channel, User};
use crate::source::{read_json, LogSource};

/// Allow-list entry that selects every channel.
pub const ALL_CHANNELS: &str = "*";

/// Keep only channels named in `allow`, in allow-list order.
///
/// A [`ALL_CHANNELS`] entry returns the input unchanged.
#[must_use]
pub fn filter_channels(channels: Vec<Channel>, allow: &[String]) -> Vec<Channel> {
    let mut selected = Vec::with_capacity(channels.len());
    for wanted in allow {
        if wanted == ALL_CHANNELS {
            return channels;
        }
        if let Some(channel) = channels.iter().find(|c| &c.name == wanted) {
            selected.push(channel.clone());
        }
    }
    selected
}

/// Channels of the bundle, sorted by name and indexed by id.
#[derive(Debug, Clone, Default)]
pub struct ChannelTable {
    channels: IndexMap<String, Channel>,
}

impl ChannelTable {
    /// Decode `name` from `source` and apply the allow-list.
    pub fn load(source: &dyn LogSource, name: &str, allow: &[String]) -> Result<Self> {
        let channels: Vec<Channel> = read_json(source, name)?;
        let total = channels.len();
        let table = Self::from_channels(filter_channels(channels, allow));
        debug!(total, selected = table.len(), "Loaded channel table");
        Ok(table)
    }

    /// Build a table from already-selected channels.
    #[must_use]
    pub fn from_channels(mut channels: Vec<Channel>) -> Self {
        channels.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            channels: channels.into_iter().map(|c| (c.id.clone(), c)).collect(),
        }
    }

    /// Channels ordered by name.
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    /// Look up a channel by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Channel> {
        self.channels.get(id)
    }

    /// Number of channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

/// Users indexed by id, and by bot id for bot users.
#[derive(Debug, Clone, Default)]
pub struct UserTable {
    users: Vec<User>,
    index: HashMap<String, usize>,
}

impl UserTable {
    /// Decode `name` from `source`.
    pub fn load(source: &dyn LogSource, name: &str) -> Result<Self> {
        let users: Vec<User> = read_json(source, name)?;
        debug!(users = users.len(), "Loaded user table");
        Ok(Self::from_users(users))
    }

    /// Build a table from decoded users.
    #[must_use]
    pub fn from_users(users: Vec<User>) -> Self {
        let mut index = HashMap::with_capacity(users.len());
        for (i, user) in users.iter().enumerate() {
            index.insert(user.id.clone(), i);
            if !user.profile.bot_id.is_empty() {
                index.insert(user.profile.bot_id.clone(), i);
            }
        }
        Self { users, index }
    }

    /// Look up a user by user id or bot id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&User> {
        self.index.get(id).map(|&i| &self.users[i])
    }

    /// All users in file order.
    #[must_use]
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Display name for `id`, empty when unknown.
    #[must_use]
    pub fn display_name(&self, id: &str) -> &str {
        self.get(id).map_or("", User::display_name)
    }
}

/// Custom emoji name to image URL.
#[derive(Debug, Clone, Default)]
pub struct EmojiTable {
    urls: HashMap<String, String>,
}

impl EmojiTable {
    /// Decode `name` from `source`.
    pub fn load(source: &dyn LogSource, name: &str) -> Result<Self> {
        let urls: HashMap<String, String> = read_json(source, name)?;
        debug!(emojis = urls.len(), "Loaded emoji table");
        Ok(Self { urls })
    }

    /// The name to URL mapping.
    #[must_use]
    pub fn urls(&self) -> &HashMap<String, String> {
        &self.urls
    }
}
