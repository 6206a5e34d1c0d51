//! User records from `users.json`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::null_as_default;

/// A workspace member or bot user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct User {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub team_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    pub deleted: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub color: String,
    #[serde(deserialize_with = "null_as_default")]
    pub real_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tz: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tz_label: String,
    /// Offset from UTC in seconds.
    pub tz_offset: i64,
    pub profile: UserProfile,
    pub is_admin: bool,
    pub is_owner: bool,
    pub is_primary_owner: bool,
    pub is_restricted: bool,
    pub is_ultra_restricted: bool,
    pub is_bot: bool,
    pub is_app_user: bool,
    pub updated: i64,
}

impl User {
    /// Name shown for this user: real name, else display name, else empty.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if !self.profile.real_name.is_empty() {
            &self.profile.real_name
        } else {
            &self.profile.display_name
        }
    }
}

/// Profile block of a user record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct UserProfile {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub skype: String,
    #[serde(deserialize_with = "null_as_default")]
    pub real_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub real_name_normalized: String,
    #[serde(deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub display_name_normalized: String,
    /// Custom profile fields, kept as raw JSON.
    pub fields: Value,
    #[serde(deserialize_with = "null_as_default")]
    pub status_text: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status_emoji: String,
    pub status_expiration: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub avatar_hash: String,
    #[serde(deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub image_24: String,
    #[serde(deserialize_with = "null_as_default")]
    pub image_32: String,
    #[serde(deserialize_with = "null_as_default")]
    pub image_48: String,
    #[serde(deserialize_with = "null_as_default")]
    pub image_72: String,
    #[serde(deserialize_with = "null_as_default")]
    pub image_192: String,
    #[serde(deserialize_with = "null_as_default")]
    pub image_512: String,
    #[serde(deserialize_with = "null_as_default")]
    pub status_text_canonical: String,
    #[serde(deserialize_with = "null_as_default")]
    pub team: String,
    #[serde(deserialize_with = "null_as_default")]
    pub bot_id: String,
}
