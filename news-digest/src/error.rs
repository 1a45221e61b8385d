//! Error types for the news-digest crate.

/// Errors that can occur while building a digest.
#[derive(Debug, thiserror::Error)]
pub enum NewsError {
    /// An HTTP request to a news source failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The source answered with something other than the expected JSON.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid digest configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Writing the report failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for news-digest results.
pub type Result<T> = std::result::Result<T, NewsError>;
