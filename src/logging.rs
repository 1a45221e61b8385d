//! Tracing subscriber setup for the binaries.
//!
//! Console output always goes to stderr so stdout stays free for reports.
//! When `logging.log_dir` is set, a daily rolling file is written as well.

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;
use crate::error::{NotifyError, Result};

/// Base name of the rolling log files.
pub const LOG_FILENAME: &str = "wecom-notify.log";

/// Filter used when `RUST_LOG` is unset.
pub fn default_filter(level: &str) -> String {
    format!("wecom_notify={level},news_digest={level}")
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns [`NotifyError::Io`] if the log directory cannot be created and
/// [`NotifyError::Config`] if a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(&config.level)));

    let file_layer = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILENAME);
            Some(
                fmt::layer()
                    .with_writer(appender)
                    .with_target(true)
                    .with_ansi(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|e| NotifyError::Config(format!("cannot install log subscriber: {e}")))
}

/// Run `f` under a temporary stderr subscriber at the default level.
///
/// Covers the events emitted while the configuration (and with it the
/// real subscriber settings) is still being loaded.
pub fn with_startup_logging<T>(f: impl FnOnce() -> T) -> T {
    let subscriber = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter("info"))),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::with_default(subscriber, f)
}
