//! Read-only query facade over one log bundle.
//!
//! [`LogStore`] owns the [`LogSource`], the side tables and one message
//! table per selected channel. Channel directories are ingested on the
//! first query that needs them and cached for the lifetime of the store.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use once_cell::unsync::OnceCell;
use tracing::{debug, info, instrument};

use crate::config::StoreConfig;
use crate::error::{Result, SlackLogError};
use crate::ingest::{IngestStats, MessageIngestor, MessageTable};
use crate::model::{Channel, Message, MonthKey, Thread, User};
use crate::source::{open_log_source, LogSource};
use crate::tables::{ChannelTable, EmojiTable, UserTable};

/// Channel list inside a bundle.
pub const CHANNELS_JSON: &str = "channels.json";
/// User list inside a bundle.
pub const USERS_JSON: &str = "users.json";

#[derive(Debug)]
struct ChannelLog {
    ingestor: MessageIngestor,
    table: MessageTable,
}

/// Query surface over an exported workspace log.
pub struct LogStore {
    source: Box<dyn LogSource>,
    config: StoreConfig,
    channels: ChannelTable,
    users: UserTable,
    emojis: EmojiTable,
    logs: HashMap<String, OnceCell<ChannelLog>>,
}

impl std::fmt::Debug for LogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogStore")
            .field("config", &self.config)
            .field("channels", &self.channels.len())
            .field("users", &self.users.users().len())
            .field("emojis", &self.emojis.urls().len())
            .finish_non_exhaustive()
    }
}

impl LogStore {
    /// Open the bundle at `path` and load its side tables.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, config: &StoreConfig) -> Result<Self> {
        let source = open_log_source(path)?;
        Self::from_source(source, config)
    }

    /// Build a store over an already opened source.
    pub fn from_source(source: Box<dyn LogSource>, config: &StoreConfig) -> Result<Self> {
        let channels = ChannelTable::load(source.as_ref(), CHANNELS_JSON, &config.channels)?;
        let users = UserTable::load(source.as_ref(), USERS_JSON)?;
        let emojis = match EmojiTable::load(source.as_ref(), &config.emoji_json) {
            Ok(table) => table,
            Err(e) if e.is_not_found() => {
                debug!(name = %config.emoji_json, "No emoji table in bundle");
                EmojiTable::default()
            }
            Err(e) => return Err(e),
        };

        let logs = channels
            .channels()
            .map(|c| (c.id.clone(), OnceCell::new()))
            .collect();

        info!(
            channels = channels.len(),
            users = users.users().len(),
            emojis = emojis.urls().len(),
            "Opened log store"
        );

        Ok(Self {
            source,
            config: config.clone(),
            channels,
            users,
            emojis,
            logs,
        })
    }

    /// Configuration the store was opened with.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Selected channels ordered by name.
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.channels()
    }

    /// Look up a selected channel by id.
    #[must_use]
    pub fn channel(&self, channel_id: &str) -> Option<&Channel> {
        self.channels.get(channel_id)
    }

    /// Month buckets of a channel, ingesting its directory on first use.
    pub fn messages_per_month(
        &self,
        channel_id: &str,
    ) -> Result<&BTreeMap<MonthKey, Vec<Message>>> {
        Ok(self.channel_log(channel_id)?.table.months())
    }

    /// Messages of one month of a channel.
    pub fn month_messages(
        &self,
        channel_id: &str,
        key: MonthKey,
    ) -> Result<Option<&[Message]>> {
        Ok(self.channel_log(channel_id)?.table.messages(&key))
    }

    /// Check whether the channel has messages in the month after `key`.
    pub fn has_next_month(&self, channel_id: &str, key: MonthKey) -> Result<bool> {
        Ok(self.channel_log(channel_id)?.table.has_next_month(key))
    }

    /// Check whether the channel has messages in the month before `key`.
    pub fn has_prev_month(&self, channel_id: &str, key: MonthKey) -> Result<bool> {
        Ok(self.channel_log(channel_id)?.table.has_prev_month(key))
    }

    /// Thread rooted at `thread_ts` in a channel.
    pub fn thread(&self, channel_id: &str, thread_ts: &str) -> Result<Option<&Thread>> {
        Ok(self.channel_log(channel_id)?.table.thread(thread_ts))
    }

    /// Ingestion counters of a channel, once it has been loaded.
    #[must_use]
    pub fn ingest_stats(&self, channel_id: &str) -> Option<&IngestStats> {
        self.logs
            .get(channel_id)
            .and_then(OnceCell::get)
            .map(|log| log.ingestor.stats())
    }

    /// Real name of a user, else the display name, else empty.
    #[must_use]
    pub fn display_name(&self, user_id: &str) -> &str {
        self.users.display_name(user_id)
    }

    /// Look up a user by user id or bot id.
    #[must_use]
    pub fn user_by_id(&self, user_id: &str) -> Option<&User> {
        self.users.get(user_id)
    }

    /// User id to display name, for every user in the bundle.
    #[must_use]
    pub fn display_name_map(&self) -> HashMap<String, String> {
        self.users
            .users()
            .iter()
            .map(|u| (u.id.clone(), u.display_name().to_string()))
            .collect()
    }

    /// Custom emoji name to image URL. Empty when the bundle has no emoji table.
    #[must_use]
    pub fn emoji_map(&self) -> &HashMap<String, String> {
        self.emojis.urls()
    }

    fn channel_log(&self, channel_id: &str) -> Result<&ChannelLog> {
        let not_found = || SlackLogError::ChannelNotFound {
            channel_id: channel_id.to_string(),
        };
        let channel = self.channels.get(channel_id).ok_or_else(not_found)?;
        let cell = self.logs.get(channel_id).ok_or_else(not_found)?;
        cell.get_or_try_init(|| load_channel(self.source.as_ref(), channel))
    }
}

#[instrument(skip_all, fields(channel = %channel.name))]
fn load_channel(source: &dyn LogSource, channel: &Channel) -> Result<ChannelLog> {
    let mut ingestor = MessageIngestor::new();
    let mut table = MessageTable::new();
    match source.open_dir(&channel.name) {
        Ok(iter) => ingestor.read_listing(&mut table, source, iter)?,
        Err(e) if e.is_not_found() => {
            debug!("Channel has no message directory");
        }
        Err(e) => return Err(e),
    }
    debug!(
        months = table.months().len(),
        messages = table.message_count(),
        threads = table.threads().len(),
        "Loaded channel"
    );
    Ok(ChannelLog { ingestor, table })
}
