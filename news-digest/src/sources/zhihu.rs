//! Zhihu hot list.

use serde_json::Value;

use super::{non_empty, text_of};
use crate::config::NewsConfig;
use crate::error::NewsError;
use crate::http::get_json;
use crate::source::NewsSource;
use crate::types::NewsItem;

const HOT_LIST_PATH: &str = "/api/v3/feed/topstory/hot-lists/total";
const QUESTION_URL: &str = "https://www.zhihu.com/question/";

/// Zhihu hot-list client.
pub struct ZhihuSource;

impl NewsSource for ZhihuSource {
    async fn fetch(
        &self,
        client: &reqwest::Client,
        config: &NewsConfig,
    ) -> Result<Vec<NewsItem>, NewsError> {
        let url = format!("{}{HOT_LIST_PATH}", config.zhihu_base.trim_end_matches('/'));
        let body = get_json(client, &url, &[("limit", config.limit.to_string())]).await?;
        parse_hot_list(&body, config.limit)
    }
}

/// Map `data[].target` entries to items.
pub(crate) fn parse_hot_list(body: &Value, limit: usize) -> Result<Vec<NewsItem>, NewsError> {
    let entries = body["data"]
        .as_array()
        .ok_or_else(|| NewsError::Parse("zhihu: missing data list".into()))?;

    Ok(entries
        .iter()
        .map(|entry| &entry["target"])
        .filter(|target| target["title"].is_string())
        .take(limit)
        .map(|target| NewsItem {
            title: text_of(&target["title"]),
            url: format!("{QUESTION_URL}{}", text_of(&target["id"])),
            excerpt: non_empty(&target["excerpt"]),
            ..NewsItem::default()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_targets_and_builds_question_links() {
        let body = json!({"data": [
            {"target": {"id": 123, "title": "Why Rust?", "excerpt": "Because."}},
            {"target": {"id": "456", "title": "No excerpt"}},
            {"target": {"id": 789}}
        ]});
        let items = parse_hot_list(&body, 10).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].url, "https://www.zhihu.com/question/123");
        assert_eq!(items[0].excerpt.as_deref(), Some("Because."));
        assert_eq!(items[1].url, "https://www.zhihu.com/question/456");
        assert_eq!(items[1].excerpt, None);
    }

    #[test]
    fn respects_limit() {
        let entries: Vec<Value> = (0..20)
            .map(|i| json!({"target": {"id": i, "title": format!("q{i}")}}))
            .collect();
        let items = parse_hot_list(&json!({ "data": entries }), 5).unwrap();
        assert_eq!(items.len(), 5);
    }

    #[test]
    fn missing_data_is_parse_error() {
        let err = parse_hot_list(&json!({"error": "denied"}), 10).unwrap_err();
        assert!(matches!(err, NewsError::Parse(_)));
    }
}
