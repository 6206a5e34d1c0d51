//! Tracing subscriber setup for binaries and tests embedding slacklog.

use std::str::FromStr;

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::error::SlackLogError;

/// Verbosity of emitted logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Only errors.
    Error,
    /// Errors and warnings.
    #[default]
    Warn,
    /// Errors, warnings, and informational messages.
    Info,
    /// All of the above plus debug messages.
    Debug,
    /// All messages including trace-level details.
    Trace,
}

impl LogLevel {
    /// Directive understood by [`EnvFilter`].
    #[must_use]
    pub const fn to_filter_string(self) -> &'static str {
        match self {
            Self::Error => "slacklog=error",
            Self::Warn => "slacklog=warn",
            Self::Info => "slacklog=info",
            Self::Debug => "slacklog=debug",
            Self::Trace => "slacklog=trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = SlackLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            other => Err(SlackLogError::InvalidConfig {
                message: format!("unknown log level: {other}"),
            }),
        }
    }
}

/// Output format of the log layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable text format.
    #[default]
    Text,
    /// Compact single-line format.
    Compact,
    /// Structured JSON format for machine consumption.
    Json,
}

/// Install a global subscriber writing to stderr.
///
/// `RUST_LOG` overrides `level` when set. Returns `false` when a global
/// subscriber was already installed.
pub fn init_logging(level: LogLevel, format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_filter_string()));

    let result = match format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry().with(filter).with(layer).try_init()
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry().with(filter).with(layer).try_init()
        }
        LogFormat::Text => {
            let layer = fmt::layer().with_writer(std::io::stderr);
            tracing_subscriber::registry().with(filter).with(layer).try_init()
        }
    };

    result.is_ok()
}
