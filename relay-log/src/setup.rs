use std::io;

use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// Import CRATE_NAMES, which lists all crates in the workspace.
include!(concat!(env!("OUT_DIR"), "/constants.gen.rs"));

/// Controls the log format.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Auto detect the best format.
    ///
    /// This chooses [`LogFormat::Pretty`] for TTY, otherwise [`LogFormat::Simplified`].
    #[default]
    Auto,

    /// Pretty printing with colors.
    ///
    /// ```text
    ///  INFO rebalance_rates: rebalanced 12 classes
    /// ```
    Pretty,

    /// Simplified plain text output.
    ///
    /// ```text
    /// 2020-12-04T12:10:32Z  INFO rebalance_rates: rebalanced 12 classes
    /// ```
    Simplified,

    /// Dump out JSON lines.
    ///
    /// ```text
    /// {"timestamp":"2020-12-04T12:11:08.729716Z","level":"INFO","message":"rebalanced 12 classes","target":"rebalance_rates"}
    /// ```
    Json,
}

/// The maximum log level for the crates of this workspace.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Logs only errors.
    Error,
    /// Logs warnings and errors.
    Warn,
    /// Logs informational messages, warnings and errors.
    #[default]
    Info,
    /// Logs everything except the most verbose messages.
    Debug,
    /// Logs everything.
    Trace,
    /// Disables logging.
    Off,
}

impl Level {
    /// Returns the tracing [`LevelFilter`] for this level.
    pub const fn level_filter(&self) -> LevelFilter {
        match self {
            Level::Error => LevelFilter::ERROR,
            Level::Warn => LevelFilter::WARN,
            Level::Info => LevelFilter::INFO,
            Level::Debug => LevelFilter::DEBUG,
            Level::Trace => LevelFilter::TRACE,
            Level::Off => LevelFilter::OFF,
        }
    }
}

/// Controls the logging system.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// The log level for the crates of this workspace.
    pub level: Level,

    /// Controls the log output format.
    ///
    /// Defaults to [`LogFormat::Auto`], which detects the best format based on the TTY.
    pub format: LogFormat,
}

/// Returns the filter directives applied when `RUST_LOG` is not set.
///
/// Third-party crates log at most at `INFO`, while all crates of this workspace log at the
/// configured level.
fn default_directives(level: LevelFilter) -> String {
    let mut directives = level.min(LevelFilter::INFO).to_string().to_lowercase();

    for name in CRATE_NAMES {
        directives.push_str(&format!(",{name}={}", level.to_string().to_lowercase()));
    }

    directives
}

/// Initialize the logging system.
///
/// Logs are written to `stderr`. The `RUST_LOG` environment variable takes precedence over the
/// configured level. Calling this more than once has no effect.
///
/// # Example
///
/// ```
/// let log_config = relay_log::LogConfig {
///     level: relay_log::Level::Debug,
///     ..Default::default()
/// };
///
/// relay_log::init(&log_config);
/// ```
pub fn init(config: &LogConfig) {
    let level = config.level.level_filter();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let format = match (config.format, console::user_attended()) {
        (LogFormat::Auto, true) | (LogFormat::Pretty, _) => tracing_subscriber::fmt::layer()
            .compact()
            .with_ansi(true)
            .without_time()
            .with_writer(io::stderr)
            .boxed(),
        (LogFormat::Auto, false) | (LogFormat::Simplified, _) => tracing_subscriber::fmt::layer()
            .compact()
            .with_ansi(false)
            .with_writer(io::stderr)
            .boxed(),
        (LogFormat::Json, _) => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_writer(io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(format.with_filter(filter))
        .try_init()
        .ok();
}
