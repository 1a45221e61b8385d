//! Shared HTTP client with User-Agent rotation.
//!
//! The hot-list endpoints reject requests without a browser-like
//! User-Agent, so one is picked per client from a built-in list.

use crate::config::NewsConfig;
use crate::error::NewsError;
use rand::seq::SliceRandom;
use std::time::Duration;

/// Realistic browser User-Agent strings.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// Build a [`reqwest::Client`] for the news endpoints.
///
/// # Errors
///
/// Returns [`NewsError::Http`] if the client cannot be constructed.
pub fn build_client(config: &NewsConfig) -> Result<reqwest::Client, NewsError> {
    let ua = match config.user_agent {
        Some(ref custom) => custom.clone(),
        None => random_user_agent().to_owned(),
    };

    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(ua)
        .build()
        .map_err(|e| NewsError::Http(format!("failed to build HTTP client: {e}")))
}

/// Select a random User-Agent string from the rotation list.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS
        .choose(&mut rng)
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// GET `url` and decode the body as JSON.
///
/// # Errors
///
/// [`NewsError::Http`] for transport failures and non-2xx statuses,
/// [`NewsError::Parse`] when the body is not JSON.
pub async fn get_json(
    client: &reqwest::Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<serde_json::Value, NewsError> {
    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| NewsError::Http(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(NewsError::Http(format!("{url} returned HTTP {status}")));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| NewsError::Http(e.to_string()))?;
    serde_json::from_slice(&body).map_err(|e| NewsError::Parse(format!("{url}: {e}")))
}
