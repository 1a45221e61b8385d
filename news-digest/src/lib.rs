//! # news-digest
//!
//! Daily hot-list digest from Zhihu, Weibo and 36Kr.
//!
//! Each source is one public JSON endpoint. Sources are queried one after
//! another with a short pause in between; a source that fails contributes
//! an empty section instead of failing the digest. The result renders to
//! a plain-text report that can be saved as `news_YYYYMMDD.txt`.

pub mod config;
pub mod digest;
pub mod error;
pub mod http;
pub mod report;
pub mod source;
pub mod sources;
pub mod types;

pub use config::NewsConfig;
pub use digest::fetch_digest;
pub use error::{NewsError, Result};
pub use report::{format_report, save_report};
pub use source::NewsSource;
pub use types::{Digest, NewsItem, NewsSection, SourceKind};
