//! Wall-clock helpers pinned to China Standard Time (UTC+8).

use chrono::{DateTime, FixedOffset, Offset, Utc};

/// Offset of Asia/Shanghai in seconds. China has no daylight saving time.
pub const CHINA_OFFSET_SECS: i32 = 8 * 3600;

/// Fixed UTC+8 offset.
pub fn china_offset() -> FixedOffset {
    FixedOffset::east_opt(CHINA_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Current time in UTC+8.
pub fn now_in_china() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&china_offset())
}

/// `YYYY-MM-DD HH:MM:SS`, the timestamp format used in every message.
pub fn format_timestamp(at: &DateTime<FixedOffset>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}
