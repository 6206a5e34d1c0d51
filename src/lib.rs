//! slacklog: read-only access to exported Slack workspace logs.
//!
//! An export bundle is a tree of JSON documents (`channels.json`,
//! `users.json`, an optional emoji map, and one directory of per-day message
//! files per channel). Bundles may be plain directories or tar (raw, gzip,
//! bzip2) or zip archives; all of them are read through one interface.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use slacklog::{LogStore, StoreConfig};
//!
//! fn main() -> slacklog::Result<()> {
//!     let store = LogStore::open("slack-export.tar.gz", &StoreConfig::default())?;
//!
//!     for channel in store.channels() {
//!         for (month, messages) in store.messages_per_month(&channel.id)? {
//!             println!("#{} {month}: {} messages", channel.name, messages.len());
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`source`]: uniform access to directory, tar and zip bundles
//! - [`ingest`]: per-day file ingestion into month buckets and threads
//! - [`tables`]: channel, user and emoji side tables
//! - [`store`]: the [`LogStore`] query facade
//! - [`model`]: records decoded from the bundle
//! - [`config`]: store configuration
//! - [`logging`]: tracing subscriber setup
//! - [`error`]: error types and handling

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod source;
pub mod store;
pub mod tables;

// Re-export commonly used types at the crate root
pub use config::StoreConfig;
pub use error::{Result, SlackLogError};
pub use store::LogStore;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::StoreConfig;
    pub use crate::error::{Result, SlackLogError};
    pub use crate::ingest::{MessageIngestor, MessageTable};
    pub use crate::model::{Channel, Message, MonthKey, Thread, User};
    pub use crate::source::{open_log_source, LogSource, LogSourceIter};
    pub use crate::store::LogStore;
}
