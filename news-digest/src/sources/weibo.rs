//! Weibo hot search.

use serde_json::Value;

use super::text_of;
use crate::config::NewsConfig;
use crate::error::NewsError;
use crate::http::get_json;
use crate::source::NewsSource;
use crate::types::NewsItem;

const HOT_SEARCH_PATH: &str = "/ajax/side/hotSearch";

/// Weibo hot-search client.
pub struct WeiboSource;

impl NewsSource for WeiboSource {
    async fn fetch(
        &self,
        client: &reqwest::Client,
        config: &NewsConfig,
    ) -> Result<Vec<NewsItem>, NewsError> {
        let url = format!("{}{HOT_SEARCH_PATH}", config.weibo_base.trim_end_matches('/'));
        let body = get_json(client, &url, &[]).await?;
        parse_hot_search(&body, config.limit)
    }
}

/// Hashtag search link for a hot-search word.
pub fn search_url(word: &str) -> String {
    format!("https://s.weibo.com/weibo?q=%23{word}%23")
}

/// Map `data.realtime[]` entries to items.
pub(crate) fn parse_hot_search(body: &Value, limit: usize) -> Result<Vec<NewsItem>, NewsError> {
    let entries = body["data"]["realtime"]
        .as_array()
        .ok_or_else(|| NewsError::Parse("weibo: missing data.realtime list".into()))?;

    Ok(entries
        .iter()
        .take(limit)
        .map(|entry| NewsItem {
            title: text_of(&entry["note"]),
            url: search_url(&text_of(&entry["word"])),
            hot_value: Some(entry["num"].as_i64().unwrap_or(0)),
            ..NewsItem::default()
        })
        .collect())
}
