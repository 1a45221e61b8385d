//! Error types for wecom-notify.

use std::path::PathBuf;

/// Top-level error type for the notification tools.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Configuration file does not exist.
    #[error("config file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// Configuration file exists but could not be parsed or is incomplete.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client construction or transport error.
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Issue-tracker API error (status code and response text).
    #[error("jira error: {status} - {message}")]
    Jira {
        /// HTTP status returned by the server (0 when no response arrived).
        status: u16,
        /// Response text or transport error message.
        message: String,
    },

    /// Scheduler error (task execution, invalid schedule).
    #[error("scheduler error: {0}")]
    Scheduler(String),

    /// News aggregation error.
    #[error("news error: {0}")]
    News(#[from] news_digest::NewsError),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, NotifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_not_found_names_the_path() {
        let err = NotifyError::ConfigNotFound(PathBuf::from("./jira_config.yaml"));
        assert_eq!(err.to_string(), "config file not found: ./jira_config.yaml");
    }

    #[test]
    fn jira_error_includes_status_and_text() {
        let err = NotifyError::Jira {
            status: 401,
            message: "Unauthorized".into(),
        };
        assert_eq!(err.to_string(), "jira error: 401 - Unauthorized");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NotifyError>();
    }
}
