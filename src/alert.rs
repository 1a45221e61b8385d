//! Markdown alert formatting for the group robot.

use chrono::{DateTime, FixedOffset};

use crate::clock::format_timestamp;

/// Alert severity, rendered as a colored label.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    #[default]
    Info,
    Warning,
    Error,
}

impl AlertLevel {
    /// Parse a level name; unknown names fall back to [`AlertLevel::Info`].
    pub fn parse_lenient(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "warning" | "warn" => Self::Warning,
            "error" => Self::Error,
            _ => Self::Info,
        }
    }

    /// Lower-case level name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// WeChat Work markdown font color for this level.
    pub fn color(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "danger",
        }
    }
}

/// Render an alert as WeChat Work markdown.
pub fn format_alert(
    title: &str,
    content: &str,
    level: AlertLevel,
    now: &DateTime<FixedOffset>,
) -> String {
    let time = serde_json::Value::String(format_timestamp(now)).to_string();
    format!(
        "\n## {title}\n\n\
         > **告警级别：** <font color=\"{color}\">{label}</font>\n\
         > **时间：** {time}\n\
         >\n\
         > **详情：**\n\
         > {content}\n",
        color = level.color(),
        label = level.as_str().to_uppercase(),
    )
}
