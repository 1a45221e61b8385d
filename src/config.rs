//! Configuration types for the notification tools.
//!
//! The configuration is a plain value: load it once in `main` with
//! [`NotifyConfig::load_or_default`] (or [`NotifyConfig::from_file`] when a
//! missing file must be fatal) and pass it by reference to whatever needs it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{NotifyError, Result};

/// Environment variable that overrides `wechat_work.webhook_url`.
pub const WEBHOOK_ENV_VAR: &str = "WECHAT_WEBHOOK_URL";

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// WeChat Work group robot settings.
    pub wechat_work: WeChatWorkConfig,
    /// Issue-tracker connection settings.
    pub jira: JiraConfig,
    /// Paced auto-sender settings.
    pub sender: SenderConfig,
    /// Break reminder settings.
    pub reminder: ReminderConfig,
    /// News digest settings.
    pub news: NewsSettings,
    /// Log output settings.
    pub logging: LoggingConfig,
}

/// WeChat Work group robot configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeChatWorkConfig {
    /// Full webhook URL including the robot key.
    pub webhook_url: Option<String>,
}

/// Issue-tracker (JIRA) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JiraConfig {
    /// Server base URL, e.g. `https://example.atlassian.net`.
    pub server: String,
    /// Account name used for basic auth.
    pub username: String,
    /// API token used for basic auth.
    pub api_token: String,
    /// Prefix prepended to issue keys in exported hyperlinks.
    /// Defaults to `<server>/browse/`.
    pub browse_prefix: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            username: String::new(),
            api_token: String::new(),
            browse_prefix: None,
            timeout_secs: 10,
        }
    }
}

impl JiraConfig {
    /// Returns an error naming the first missing credential.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("jira.server", &self.server),
            ("jira.username", &self.username),
            ("jira.api_token", &self.api_token),
        ] {
            if value.trim().is_empty() {
                return Err(NotifyError::Config(format!("{name} is not set")));
            }
        }
        Ok(())
    }

    /// Hyperlink prefix for issue keys.
    pub fn browse_url_prefix(&self) -> String {
        match &self.browse_prefix {
            Some(prefix) => prefix.clone(),
            None => format!("{}/browse/", self.server.trim_end_matches('/')),
        }
    }
}

/// Paced auto-sender configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Seconds between two status reports.
    pub interval_secs: u64,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self { interval_secs: 30 }
    }
}

/// Break reminder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    /// Minutes between two reminders.
    pub interval_minutes: u64,
    /// Reminder title.
    pub title: String,
    /// Reminder body.
    pub message: String,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 1,
            title: "💧 休息时间到！".to_owned(),
            message: "起来走动一下，放松眼睛，补充水分。保持健康，提高效率！".to_owned(),
        }
    }
}

/// News digest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsSettings {
    /// Items fetched per source.
    pub limit: usize,
    /// Directory the dated report is written to.
    pub output_dir: PathBuf,
    /// Local time (`HH:MM`, UTC+8) of the scheduled daily run.
    pub daily_at: String,
}

impl Default for NewsSettings {
    fn default() -> Self {
        Self {
            limit: 10,
            output_dir: PathBuf::from("."),
            daily_at: "08:00".to_owned(),
        }
    }
}

impl NewsSettings {
    /// Build the aggregator configuration from these settings.
    pub fn to_digest_config(&self) -> news_digest::NewsConfig {
        news_digest::NewsConfig {
            limit: self.limit,
            ..Default::default()
        }
    }
}

/// Log output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is unset.
    pub level: String,
    /// Directory for daily rolling log files. Console only when `None`.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            log_dir: None,
        }
    }
}

impl NotifyConfig {
    /// Load configuration from a YAML (default), TOML (`.toml`) or INI
    /// (`.ini`) file.
    ///
    /// An empty file yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::ConfigNotFound`] when the file does not exist,
    /// and [`NotifyError::Config`] when it cannot be parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(NotifyError::ConfigNotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let config = match extension.as_deref() {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| NotifyError::Config(e.to_string()))?
            }
            Some("ini") => Self::from_ini(&content)?,
            _ => serde_yaml::from_str(&content).map_err(|e| NotifyError::Config(e.to_string()))?,
        };
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Load configuration, treating a missing file as an empty configuration.
    ///
    /// # Errors
    ///
    /// Returns an error only when the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::from_file(path) {
            Ok(config) => Ok(config),
            Err(NotifyError::ConfigNotFound(path)) => {
                warn!("config file {} does not exist, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Parse an INI file whose sections mirror the YAML layout:
    /// `[wechat_work]`, `[jira]`, `[sender]`, `[reminder]`, `[news]` and
    /// `[logging]`. Unknown sections and keys are ignored.
    fn from_ini(content: &str) -> Result<Self> {
        let ini = ini::Ini::load_from_str(content).map_err(|e| NotifyError::Config(e.to_string()))?;
        let get = |section: &str, key: &str| {
            ini.section(Some(section))
                .and_then(|props| props.get(key))
                .map(str::trim)
        };

        let mut config = Self::default();
        if let Some(url) = get("wechat_work", "webhook_url") {
            config.wechat_work.webhook_url = Some(url.to_owned());
        }

        let jira = &mut config.jira;
        for (key, field) in [
            ("server", &mut jira.server),
            ("username", &mut jira.username),
            ("api_token", &mut jira.api_token),
        ] {
            if let Some(value) = get("jira", key) {
                *field = value.to_owned();
            }
        }
        if let Some(prefix) = get("jira", "browse_prefix") {
            jira.browse_prefix = Some(prefix.to_owned());
        }
        if let Some(secs) = get("jira", "timeout_secs") {
            jira.timeout_secs = parse_ini_value("jira.timeout_secs", secs)?;
        }

        if let Some(secs) = get("sender", "interval_secs") {
            config.sender.interval_secs = parse_ini_value("sender.interval_secs", secs)?;
        }

        if let Some(minutes) = get("reminder", "interval_minutes") {
            config.reminder.interval_minutes = parse_ini_value("reminder.interval_minutes", minutes)?;
        }
        if let Some(title) = get("reminder", "title") {
            config.reminder.title = title.to_owned();
        }
        if let Some(message) = get("reminder", "message") {
            config.reminder.message = message.to_owned();
        }

        if let Some(limit) = get("news", "limit") {
            config.news.limit = parse_ini_value("news.limit", limit)?;
        }
        if let Some(dir) = get("news", "output_dir") {
            config.news.output_dir = PathBuf::from(dir);
        }
        if let Some(at) = get("news", "daily_at") {
            config.news.daily_at = at.to_owned();
        }

        if let Some(level) = get("logging", "level") {
            config.logging.level = level.to_owned();
        }
        if let Some(dir) = get("logging", "log_dir") {
            config.logging.log_dir = Some(PathBuf::from(dir));
        }

        Ok(config)
    }

    /// Webhook URL with the [`WEBHOOK_ENV_VAR`] override applied.
    pub fn resolve_webhook_url(&self) -> Option<String> {
        self.webhook_url_with_override(std::env::var(WEBHOOK_ENV_VAR).ok())
    }

    /// Webhook URL, preferring a non-blank `env_value` over the file value.
    pub fn webhook_url_with_override(&self, env_value: Option<String>) -> Option<String> {
        if let Some(url) = env_value.filter(|url| !url.trim().is_empty()) {
            debug!("using webhook URL from {WEBHOOK_ENV_VAR}");
            return Some(url);
        }
        self.wechat_work
            .webhook_url
            .clone()
            .filter(|url| !url.trim().is_empty())
    }
}

fn parse_ini_value<T>(name: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| NotifyError::Config(format!("{name}: {e}")))
}
