//! Digest orchestrator: query each source in turn and collect sections.

use std::time::Duration;

use crate::config::NewsConfig;
use crate::error::NewsError;
use crate::source::NewsSource;
use crate::sources::{Kr36Source, WeiboSource, ZhihuSource};
use crate::types::{Digest, NewsItem, NewsSection, SourceKind};

/// Fetch every configured source, one after another.
///
/// Sources are spaced by `config.request_delay_ms`. A failing source is
/// logged and contributes an empty section; the digest itself only fails
/// on invalid configuration.
///
/// # Errors
///
/// Returns [`NewsError::Config`] for an invalid configuration and
/// [`NewsError::Http`] if the HTTP client cannot be built.
pub async fn fetch_digest(config: &NewsConfig) -> Result<Digest, NewsError> {
    config.validate()?;
    let client = crate::http::build_client(config)?;
    let delay = Duration::from_millis(config.request_delay_ms);

    let mut sections = Vec::with_capacity(config.sources.len());
    for (index, source) in config.sources.iter().copied().enumerate() {
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let items = match query_source(source, &client, config).await {
            Ok(items) => {
                tracing::debug!(%source, count = items.len(), "source returned items");
                items
            }
            Err(err) => {
                tracing::warn!(source = %source, error = %err, "source query failed");
                Vec::new()
            }
        };
        sections.push(NewsSection { source, items });
    }

    Ok(Digest {
        sections,
        limit: config.limit,
    })
}

/// Query a single source, dispatching to the concrete implementation.
async fn query_source(
    source: SourceKind,
    client: &reqwest::Client,
    config: &NewsConfig,
) -> Result<Vec<NewsItem>, NewsError> {
    match source {
        SourceKind::Zhihu => ZhihuSource.fetch(client, config).await,
        SourceKind::Weibo => WeiboSource.fetch(client, config).await,
        SourceKind::Kr36 => Kr36Source.fetch(client, config).await,
    }
}
