//! Error types for slacklog.
//!
//! Errors fall into three groups that callers treat differently:
//! - construction errors raised while opening a log source (fatal, the input
//!   has to be corrected before retrying),
//! - [`SlackLogError::NotFound`] for entries absent from a source, which callers
//!   use to treat optional inputs as missing,
//! - content errors (malformed JSON, unreadable streams) raised during ingestion.

use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for slacklog operations.
#[derive(Error, Debug)]
pub enum SlackLogError {
    /// The named entry does not exist in the log source.
    #[error("Entry not found: {name}")]
    NotFound {
        /// Logical name (or resolved location) of the missing entry.
        name: String,
    },

    /// The archive extension does not map to a supported compression.
    #[error("Unsupported compression type: {path}")]
    UnsupportedCompression {
        /// Path of the archive.
        path: PathBuf,
    },

    /// The backing file of a log source does not exist or cannot be stat'ed.
    #[error("Log source unavailable: {path}")]
    SourceUnavailable {
        /// Path of the backing file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The backing file of an archive source is not a regular file.
    #[error("Not a regular file: {path}")]
    NotRegularFile {
        /// Offending path.
        path: PathBuf,
    },

    /// No marker entry was found while scanning an archive for its root prefix.
    #[error("Failed to detect prefix in archive: {path}")]
    PrefixNotDetected {
        /// Path of the archive.
        path: PathBuf,
    },

    /// A directory was requested but the entry is something else.
    #[error("Not a directory: {path}")]
    NotADirectory {
        /// Offending path.
        path: PathBuf,
    },

    /// A JSON document inside the log source could not be decoded.
    #[error("Failed to unmarshal {name}: {source}")]
    ParseError {
        /// Logical name of the entry.
        name: String,
        /// Underlying serde_json error.
        #[source]
        source: serde_json::Error,
    },

    /// The zip central directory or one of its entries is unreadable.
    #[error("Zip archive error: {context}")]
    ZipError {
        /// Context describing the operation that failed.
        context: String,
        /// Underlying zip error.
        #[source]
        source: zip::result::ZipError,
    },

    /// A channel id is not registered in the store.
    #[error("Channel not found: id={channel_id}")]
    ChannelNotFound {
        /// The unknown channel id.
        channel_id: String,
    },

    /// A year/month pair does not form a valid month key.
    #[error("Invalid month key: {value}")]
    InvalidMonthKey {
        /// The rejected value.
        value: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Human-readable error message.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {context}")]
    IoError {
        /// Context describing the operation that failed.
        context: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl SlackLogError {
    /// Create a new I/O error with context.
    #[must_use]
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoError {
            context: context.into(),
            source,
        }
    }

    /// Create a new not-found error.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Map an I/O error on `name`, turning `ErrorKind::NotFound` into
    /// [`SlackLogError::NotFound`].
    #[must_use]
    pub fn from_io(name: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::not_found(name)
        } else {
            Self::io(format!("Failed to open {name}"), source)
        }
    }

    /// Check whether this error reports an entry absent from a log source.
    ///
    /// I/O failures on the backing store are not included, even when their
    /// kind is `NotFound`.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check whether this error was raised while constructing a log source.
    #[must_use]
    pub const fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedCompression { .. }
                | Self::SourceUnavailable { .. }
                | Self::NotRegularFile { .. }
                | Self::PrefixNotDetected { .. }
        )
    }
}

/// Result type alias for slacklog operations.
pub type Result<T> = std::result::Result<T, SlackLogError>;

impl From<std::io::Error> for SlackLogError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            context: "I/O operation failed".to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinguishable() {
        let err = SlackLogError::not_found("emojis.json");
        assert!(err.is_not_found());
        assert!(!err.is_construction_error());

        let other = SlackLogError::io(
            "read",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!other.is_not_found());

        // a vanished backing file is not an absent entry
        let backing = SlackLogError::io(
            "Failed to open bundle.tar",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(!backing.is_not_found());
    }

    #[test]
    fn test_from_io_maps_not_found() {
        let err = SlackLogError::from_io(
            "general/2024-01-01.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(
            err,
            SlackLogError::NotFound { ref name } if name == "general/2024-01-01.json"
        ));
    }

    #[test]
    fn test_construction_errors() {
        let err = SlackLogError::UnsupportedCompression {
            path: PathBuf::from("logs.rar"),
        };
        assert!(err.is_construction_error());

        let err = SlackLogError::PrefixNotDetected {
            path: PathBuf::from("logs.tar"),
        };
        assert!(err.is_construction_error());
        assert_eq!(err.to_string(), "Failed to detect prefix in archive: logs.tar");
    }
}
