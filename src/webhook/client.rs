use super::{DeliveryError, MessageKind, MessageSink, build_payload};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info, warn};

/// Fixed request timeout for webhook posts.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Robot reply body: `{"errcode": 0, "errmsg": "ok"}`.
#[derive(Debug, Deserialize)]
struct WebhookReply {
    /// Any JSON value; only a numeric zero (`0` or `0.0`) counts as success.
    errcode: Option<serde_json::Value>,
    #[serde(default)]
    errmsg: Option<String>,
}

/// Client for one webhook URL. Cheap to clone; connections are pooled.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    url: String,
    client: reqwest::Client,
}

impl WebhookClient {
    /// Client for `url` with the default 10 second timeout.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NotifyError::Http`] if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>) -> crate::Result<Self> {
        Self::with_timeout(url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Client for `url` with a custom request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NotifyError::Http`] if the HTTP client cannot be built.
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| crate::NotifyError::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Target URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Post `content` once and classify the outcome.
    ///
    /// # Errors
    ///
    /// Returns the [`DeliveryError`] class of the failure.
    pub async fn deliver(&self, kind: MessageKind, content: &str) -> Result<(), DeliveryError> {
        let payload = build_payload(kind, content);

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;
        let reply: WebhookReply = serde_json::from_slice(&body)
            .map_err(|e| DeliveryError::MalformedResponse(e.to_string()))?;

        match reply.errcode {
            Some(code) if code.as_f64() == Some(0.0) => Ok(()),
            errcode => Err(DeliveryError::Rejected {
                errcode: errcode.as_ref().and_then(serde_json::Value::as_i64),
                errmsg: reply.errmsg.unwrap_or_default(),
            }),
        }
    }

    /// Post `content` once, logging the outcome. Returns `true` on success.
    pub async fn send(&self, kind: MessageKind, content: &str) -> bool {
        match self.deliver(kind, content).await {
            Ok(()) => {
                info!("{kind} message sent");
                true
            }
            Err(e @ (DeliveryError::Timeout | DeliveryError::Connect(_))) => {
                warn!("webhook unreachable: {e}");
                false
            }
            Err(e @ DeliveryError::Rejected { .. }) => {
                warn!("webhook refused message: {e}");
                false
            }
            Err(e) => {
                error!("webhook delivery failed: {e}");
                false
            }
        }
    }
}

#[async_trait]
impl MessageSink for WebhookClient {
    async fn send_message(&self, kind: MessageKind, content: &str) -> bool {
        self.send(kind, content).await
    }
}

fn classify_reqwest_error(err: &reqwest::Error) -> DeliveryError {
    if err.is_timeout() {
        DeliveryError::Timeout
    } else if err.is_connect() {
        DeliveryError::Connect(err.to_string())
    } else {
        DeliveryError::Other(err.to_string())
    }
}
