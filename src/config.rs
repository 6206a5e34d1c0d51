//! Store configuration.
//!
//! Loaded from TOML when the file ends in `.toml`, JSON otherwise:
//!
//! ```toml
//! channels = ["general", "random"]
//! emoji_json = "emojis.json"
//! edited_suffix = "(edited)"
//! base_url = "https://logs.example.com"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SlackLogError};
use crate::tables::ALL_CHANNELS;

/// Default name of the emoji map inside a bundle.
pub const DEFAULT_EMOJI_JSON: &str = "emojis.json";

/// Settings consumed by [`crate::LogStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Channel names to expose. `"*"` selects every channel.
    pub channels: Vec<String>,
    /// Logical path of the emoji map.
    pub emoji_json: String,
    /// Marker appended to edited messages by renderers.
    pub edited_suffix: String,
    /// Base URL under which rendered pages are published.
    pub base_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            channels: vec![ALL_CHANNELS.to_string()],
            emoji_json: DEFAULT_EMOJI_JSON.to_string(),
            edited_suffix: String::new(),
            base_url: String::new(),
        }
    }
}

impl StoreConfig {
    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SlackLogError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;

        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
        if is_toml {
            toml::from_str(&content).map_err(|e| SlackLogError::InvalidConfig {
                message: e.to_string(),
            })
        } else {
            serde_json::from_str(&content).map_err(|e| SlackLogError::InvalidConfig {
                message: e.to_string(),
            })
        }
    }

    /// Check whether every channel is selected.
    #[must_use]
    pub fn selects_all_channels(&self) -> bool {
        self.channels.iter().any(|c| c == ALL_CHANNELS)
    }
}
