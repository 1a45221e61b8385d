//! Trait definition for news source backends.

use crate::config::NewsConfig;
use crate::error::NewsError;
use crate::types::NewsItem;

/// A hot-list backend.
///
/// Implementors request one JSON endpoint and map its entries to
/// [`NewsItem`]s, keeping at most `config.limit` of them.
pub trait NewsSource: Send + Sync {
    /// Fetch the current list.
    ///
    /// # Errors
    ///
    /// Returns [`NewsError`] if the request fails or the response does not
    /// have the expected shape.
    fn fetch(
        &self,
        client: &reqwest::Client,
        config: &NewsConfig,
    ) -> impl std::future::Future<Output = Result<Vec<NewsItem>, NewsError>> + Send;
}
