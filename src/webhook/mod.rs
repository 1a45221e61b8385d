//! WeChat Work group-robot webhook delivery.
//!
//! [`WebhookClient`] posts one JSON envelope per message and classifies the
//! outcome into [`DeliveryError`]. Nothing is retried here; loops that want
//! another attempt simply send again on their next cycle.

pub mod client;

use async_trait::async_trait;
use serde_json::json;

pub use client::{DEFAULT_TIMEOUT_SECS, WebhookClient};

/// Message format understood by the robot.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Plain text.
    #[default]
    Text,
    /// WeChat Work markdown subset.
    Markdown,
}

impl MessageKind {
    /// Value of the `msgtype` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Markdown => "markdown",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MessageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "markdown" => Ok(Self::Markdown),
            other => Err(format!("unsupported message type: {other}")),
        }
    }
}

/// JSON envelope for `content` as a `kind` message.
pub fn build_payload(kind: MessageKind, content: &str) -> serde_json::Value {
    match kind {
        MessageKind::Text => json!({
            "msgtype": "text",
            "text": { "content": content }
        }),
        MessageKind::Markdown => json!({
            "msgtype": "markdown",
            "markdown": { "content": content }
        }),
    }
}

/// Why a delivery failed. Exactly one class applies to each failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// No response within the request timeout.
    #[error("request timed out")]
    Timeout,

    /// The endpoint could not be reached.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The endpoint answered with a non-2xx status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// The response body is not the expected JSON object.
    #[error("malformed JSON response: {0}")]
    MalformedResponse(String),

    /// The robot rejected the message (`errcode` other than zero).
    #[error("rejected by server: errcode={errcode:?}, errmsg={errmsg}")]
    Rejected {
        /// Application status code, `None` when the field was missing.
        errcode: Option<i64>,
        /// Server-provided explanation.
        errmsg: String,
    },

    /// Anything else (request construction, body read, ...).
    #[error("unexpected error: {0}")]
    Other(String),
}

/// Destination for outbound messages.
///
/// Implementations report success as `true` and log their own failures.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Deliver one message.
    async fn send_message(&self, kind: MessageKind, content: &str) -> bool;
}
