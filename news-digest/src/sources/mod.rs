//! News source implementations.

pub mod kr36;
pub mod weibo;
pub mod zhihu;

pub use kr36::Kr36Source;
pub use weibo::WeiboSource;
pub use zhihu::ZhihuSource;

use serde_json::Value;

/// Text form of an id or label that may be a JSON string or number.
pub(crate) fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// `Some(text)` unless the text is empty.
pub(crate) fn non_empty(value: &Value) -> Option<String> {
    Some(text_of(value)).filter(|s| !s.is_empty())
}
