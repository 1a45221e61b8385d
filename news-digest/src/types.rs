//! Core types for news items and source identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single hot-list entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewsItem {
    /// Headline.
    pub title: String,
    /// Link to the item.
    pub url: String,
    /// Excerpt or summary, when the source provides one.
    pub excerpt: Option<String>,
    /// Popularity figure (Weibo hot value).
    pub hot_value: Option<i64>,
    /// Publication time as given by the source.
    pub published_at: Option<String>,
}

/// Supported news sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// Zhihu hot list.
    Zhihu,
    /// Weibo hot search.
    Weibo,
    /// 36Kr newsflash.
    Kr36,
}

impl SourceKind {
    /// Human-readable source name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Zhihu => "Zhihu",
            Self::Weibo => "Weibo",
            Self::Kr36 => "36Kr",
        }
    }

    /// All sources, in report order.
    pub fn all() -> &'static [SourceKind] {
        &[Self::Zhihu, Self::Weibo, Self::Kr36]
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Items fetched from one source. Empty when the source failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsSection {
    pub source: SourceKind,
    pub items: Vec<NewsItem>,
}

/// One digest run: a section per configured source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Digest {
    pub sections: Vec<NewsSection>,
    /// Per-source item limit the digest was fetched with.
    pub limit: usize,
}

impl Digest {
    /// Items of `source`, empty when absent.
    pub fn items(&self, source: SourceKind) -> &[NewsItem] {
        self.sections
            .iter()
            .find(|s| s.source == source)
            .map(|s| s.items.as_slice())
            .unwrap_or_default()
    }

    /// Total number of items across sections.
    pub fn len(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
