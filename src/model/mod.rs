//! Core data structures for exported Slack logs.
//!
//! - [`Message`] and its sub-records, decoded from day files
//! - [`MonthKey`] used to bucket messages per calendar month
//! - [`Thread`] grouping a root message with its replies
//! - [`Channel`] and [`User`] records from the side tables

mod channel;
mod message;
mod month;
mod thread;
mod user;

pub use channel::*;
pub use message::*;
pub use month::*;
pub use thread::*;
pub use user::*;

use serde::{Deserialize, Deserializer};

/// Decode a field, mapping an explicit JSON `null` to the type's default.
///
/// Exports write `null` for unset strings and lists in places, which a
/// plain `#[serde(default)]` only covers when the key is absent.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_null_fields_decode_as_defaults() {
        let msg: Message = serde_json::from_str(
            r#"{"type":"message","subtype":null,"user":"U01","text":null,"ts":"1704412800.000100",
                "thread_ts":null,"reactions":null,"files":[{"id":"F01","name":null}],
                "edited":{"user":null,"ts":"1704412900.000000"}}"#,
        )
        .unwrap();
        assert_eq!(msg.subtype, "");
        assert_eq!(msg.text, "");
        assert!(msg.is_visible());
        assert!(!msg.in_thread());
        assert!(msg.reactions.is_empty());
        assert_eq!(msg.files[0].name, "");
        assert_eq!(msg.edited.as_ref().unwrap().user, "");

        let user: User = serde_json::from_str(
            r#"{"id":"U01","name":"ann","real_name":null,
                "profile":{"display_name":null,"bot_id":null}}"#,
        )
        .unwrap();
        assert_eq!(user.real_name, "");
        assert_eq!(user.profile.display_name, "");

        let channel: Channel =
            serde_json::from_str(r#"{"id":"C01","name":"general","members":null}"#).unwrap();
        assert!(channel.members.is_empty());
    }

    #[test]
    fn test_present_values_are_kept() {
        let msg: Message = serde_json::from_str(
            r#"{"type":"message","subtype":"bot_message","ts":"1.0"}"#,
        )
        .unwrap();
        assert_eq!(msg.subtype, "bot_message");
    }
}
