//! Plain-text report rendering and saving.

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::error::NewsError;
use crate::types::{Digest, SourceKind};

const RULE_WIDTH: usize = 60;
const EXCERPT_CHARS: usize = 100;

/// First [`EXCERPT_CHARS`] characters of `text`, followed by `...`.
pub fn excerpt(text: &str) -> String {
    let mut out: String = text.chars().take(EXCERPT_CHARS).collect();
    out.push_str("...");
    out
}

/// Render `digest` as the daily report. Sources without items are omitted.
pub fn format_report(digest: &Digest, now: &DateTime<FixedOffset>) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let mut lines: Vec<String> = vec![
        heavy.clone(),
        format!("📰 每日新闻早报 - {}", now.format("%Y年%m月%d日 %A")),
        heavy.clone(),
        String::new(),
    ];

    for section in digest.sections.iter().filter(|s| !s.items.is_empty()) {
        lines.push(match section.source {
            SourceKind::Zhihu => format!("🔥 知乎热榜 TOP {}", digest.limit),
            SourceKind::Weibo => format!("🔥 微博热搜 TOP {}", digest.limit),
            SourceKind::Kr36 => "💼 36氪快讯".to_owned(),
        });
        lines.push(light.clone());

        for (i, item) in section.items.iter().enumerate() {
            let n = i + 1;
            match section.source {
                SourceKind::Zhihu => {
                    lines.push(format!("{n}. {}", item.title));
                    if let Some(text) = &item.excerpt {
                        lines.push(format!("   摘要: {}", excerpt(text)));
                    }
                    lines.push(format!("   链接: {}", item.url));
                }
                SourceKind::Weibo => {
                    lines.push(format!("{n}. {} (热度: {})", item.title, item.hot_value.unwrap_or(0)));
                    lines.push(format!("   链接: {}", item.url));
                }
                SourceKind::Kr36 => {
                    lines.push(format!("{n}. {}", item.title));
                    if let Some(text) = &item.excerpt {
                        lines.push(format!("   {}", excerpt(text)));
                    }
                    lines.push(format!("   时间: {}", item.published_at.as_deref().unwrap_or("")));
                }
            }
            lines.push(String::new());
        }
    }

    lines.push(heavy.clone());
    lines.push(format!("生成时间: {}", now.format("%Y-%m-%d %H:%M:%S")));
    lines.push(heavy);
    lines.join("\n")
}

/// File name of the report for `date`: `news_YYYYMMDD.txt`.
pub fn report_file_name(date: NaiveDate) -> String {
    format!("news_{}.txt", date.format("%Y%m%d"))
}

/// Write `content` to `dir/news_YYYYMMDD.txt`, replacing an existing file.
pub fn save_report(dir: &Path, content: &str, date: NaiveDate) -> Result<PathBuf, NewsError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(report_file_name(date));
    std::fs::write(&path, content)?;
    tracing::info!("report saved to {}", path.display());
    Ok(path)
}
