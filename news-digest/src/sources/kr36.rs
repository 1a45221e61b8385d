//! 36Kr newsflash.

use serde_json::Value;

use super::{non_empty, text_of};
use crate::config::NewsConfig;
use crate::error::NewsError;
use crate::http::get_json;
use crate::source::NewsSource;
use crate::types::NewsItem;

const NEWSFLASH_PATH: &str = "/api/newsflash";
const NEWSFLASH_URL: &str = "https://36kr.com/newsflashes/";

/// 36Kr newsflash client.
pub struct Kr36Source;

impl NewsSource for Kr36Source {
    async fn fetch(
        &self,
        client: &reqwest::Client,
        config: &NewsConfig,
    ) -> Result<Vec<NewsItem>, NewsError> {
        let url = format!("{}{NEWSFLASH_PATH}", config.kr36_base.trim_end_matches('/'));
        let body = get_json(client, &url, &[]).await?;
        parse_newsflash(&body, config.limit)
    }
}

/// Map `data.items[]` entries to items.
pub(crate) fn parse_newsflash(body: &Value, limit: usize) -> Result<Vec<NewsItem>, NewsError> {
    let entries = body["data"]["items"]
        .as_array()
        .ok_or_else(|| NewsError::Parse("36kr: missing data.items list".into()))?;

    Ok(entries
        .iter()
        .take(limit)
        .map(|entry| NewsItem {
            title: text_of(&entry["title"]),
            url: format!("{NEWSFLASH_URL}{}", text_of(&entry["id"])),
            excerpt: non_empty(&entry["summary"]),
            published_at: Some(text_of(&entry["published_at"])),
            ..NewsItem::default()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_items_with_time_and_link() {
        let body = json!({"data": {"items": [
            {"id": 2_001, "title": "Funding round", "summary": "Series B", "published_at": "2024-06-14 08:01:00"},
            {"id": 2_002, "title": "Short", "summary": ""}
        ]}});
        let items = parse_newsflash(&body, 10).unwrap();
        assert_eq!(items[0].url, "https://36kr.com/newsflashes/2001");
        assert_eq!(items[0].excerpt.as_deref(), Some("Series B"));
        assert_eq!(items[0].published_at.as_deref(), Some("2024-06-14 08:01:00"));
        assert_eq!(items[1].excerpt, None);
        assert_eq!(items[1].published_at.as_deref(), Some(""));
    }

    #[test]
    fn limit_applies() {
        let entries: Vec<Value> = (0..4).map(|i| json!({"id": i, "title": "t"})).collect();
        let body = json!({"data": {"items": entries}});
        assert_eq!(parse_newsflash(&body, 2).unwrap().len(), 2);
    }
}
