//! Daily reading reminder: weekday-aware filtering and highlighting.
//!
//! A reading block is a few header lines, the column-header line
//! ([`HEADER_MARKER`]) and then one dated entry per line:
//!
//! ```text
//! 每日早读
//! 时间："2024-06-14 08:30:00 +0800"
//! 日期 读书内容 页数
//! 6月14日 循循善诱 10-12
//! ```
//!
//! [`process_daily_reading`] reduces such a block to the weekday entries,
//! with today's entry wrapped in [`HIGHLIGHT_START`] / [`HIGHLIGHT_END`].

pub mod delivery;

pub use delivery::{DailyRun, run_daily_reading};

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info};

/// Column-header line separating header lines from dated entries.
pub const HEADER_MARKER: &str = "日期 读书内容 页数";

/// Markup opening today's entry (orange bold in WeChat Work markdown).
pub const HIGHLIGHT_START: &str = "<font color=\"warning\">**";

/// Markup closing today's entry.
pub const HIGHLIGHT_END: &str = "**</font>";

/// Default reminder title.
pub const DEFAULT_TITLE: &str = "每日早读";

/// Entries used when no plan file is given.
pub const DEFAULT_PLAN: &str = include_str!("default_plan.txt");

/// `<month>月<day>日 <content> <from>-<to>`, anchored at the line start.
#[allow(clippy::expect_used)]
static ENTRY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)月(\d+)日\s+(.*)\s+(\d+-\d+)").expect("entry pattern is a valid literal")
});

/// What to do when no entry is dated today.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum MissingTodayPolicy {
    /// Produce no message.
    #[default]
    Suppress,
    /// Send the remaining weekday entries without a highlight.
    Send,
}

/// Result of filtering a reading block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadingOutcome {
    /// The reference date is a Saturday or Sunday.
    Weekend,
    /// No entry is dated today and the policy suppresses the message.
    MissingToday,
    /// Message ready to send.
    Message(String),
}

impl ReadingOutcome {
    /// The message text, or `""` when nothing should be sent.
    pub fn into_message(self) -> String {
        match self {
            Self::Message(message) => message,
            Self::Weekend | Self::MissingToday => String::new(),
        }
    }
}

/// Filter `block` for `today` and return the message, or `""` when nothing
/// should be sent.
pub fn process_daily_reading(block: &str, today: NaiveDate, policy: MissingTodayPolicy) -> String {
    filter_daily_reading(block, today, policy).into_message()
}

/// Filter `block` for `today`, reporting why a message was withheld.
pub fn filter_daily_reading(
    block: &str,
    today: NaiveDate,
    policy: MissingTodayPolicy,
) -> ReadingOutcome {
    if is_weekend(today) {
        info!("{today} ({}) is a weekend, nothing to send", today.weekday());
        return ReadingOutcome::Weekend;
    }
    debug!("{today} ({}) is a weekday, filtering entries", today.weekday());

    let mut header_lines: Vec<&str> = Vec::new();
    let mut entry_lines: Vec<String> = Vec::new();
    let mut in_entries = false;
    let mut found_today = false;

    for line in block.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if line.contains(HEADER_MARKER) {
            in_entries = true;
            header_lines.push(line);
            continue;
        }
        if !in_entries {
            header_lines.push(line);
            continue;
        }

        let Some(date) = entry_date(line, today.year()) else {
            continue;
        };
        if is_weekend(date) {
            continue;
        }

        if date == today {
            found_today = true;
            entry_lines.push(format!("{HIGHLIGHT_START}{line}{HIGHLIGHT_END}"));
        } else {
            entry_lines.push(line.to_owned());
        }
    }

    if !found_today && policy == MissingTodayPolicy::Suppress {
        info!("no reading entry for {today}, nothing to send");
        return ReadingOutcome::MissingToday;
    }

    let mut lines: Vec<&str> = header_lines;
    lines.extend(entry_lines.iter().map(String::as_str));
    ReadingOutcome::Message(lines.join("\n"))
}

/// Date of an entry line in `year`, or `None` when the line does not have
/// the entry shape or names an impossible date.
fn entry_date(line: &str, year: i32) -> Option<NaiveDate> {
    let captures = ENTRY_PATTERN.captures(line)?;
    let month: u32 = captures.get(1)?.as_str().parse().ok()?;
    let day: u32 = captures.get(2)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Saturday or Sunday.
pub fn is_weekend(date: NaiveDate) -> bool {
    date.weekday().num_days_from_monday() >= 5
}

/// Build the full reading block: title, send time, column header, entries.
pub fn compose_reading_block(title: &str, now: &DateTime<FixedOffset>, entries: &str) -> String {
    let time = now.format("%Y-%m-%d %H:%M:%S %z").to_string();
    // Quoted like a JSON string so the time renders verbatim in markdown.
    let quoted = serde_json::Value::String(time).to_string();

    let mut block = format!("{title}\n时间：{quoted}\n{HEADER_MARKER}\n");
    for line in entries.lines().map(str::trim).filter(|line| !line.is_empty()) {
        block.push_str(line);
        block.push('\n');
    }
    block
}
