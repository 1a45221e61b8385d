//! Daily news job: fetch the digest, print it and save the dated report.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use futures_util::FutureExt;
use tracing::info;

use crate::clock::{format_timestamp, now_in_china};
use crate::config::NewsSettings;
use crate::error::Result;
use crate::scheduler::{ScheduledTask, TaskExecutor, TaskResult};

/// Task id of the scheduled digest.
pub const NEWS_TASK_ID: &str = "daily_news";

/// One digest run per call to [`NewsJob::run_once`].
pub struct NewsJob {
    settings: NewsSettings,
    digest_config: news_digest::NewsConfig,
}

impl NewsJob {
    pub fn new(settings: NewsSettings) -> Self {
        let digest_config = settings.to_digest_config();
        Self {
            settings,
            digest_config,
        }
    }

    /// Replace the aggregator configuration (source URLs, delays).
    pub fn with_digest_config(mut self, config: news_digest::NewsConfig) -> Self {
        self.digest_config = config;
        self
    }

    /// Fetch, render and save. Returns the report text and its path.
    pub async fn run_once(&self, now: &DateTime<FixedOffset>) -> Result<(String, PathBuf)> {
        info!("fetching news digest at {}", format_timestamp(now));
        let digest = news_digest::fetch_digest(&self.digest_config).await?;
        let report = news_digest::format_report(&digest, now);
        let path = news_digest::save_report(&self.settings.output_dir, &report, now.date_naive())?;
        Ok((report, path))
    }

    /// Daily task at `news.daily_at`, first due after `now`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NotifyError::Scheduler`] if `daily_at` is not `HH:MM`.
    pub fn task(&self, now: &DateTime<FixedOffset>) -> Result<ScheduledTask> {
        let schedule = crate::scheduler::Schedule::daily_at(&self.settings.daily_at).ok_or_else(|| {
            crate::NotifyError::Scheduler(format!(
                "invalid news.daily_at {:?}, expected HH:MM",
                self.settings.daily_at
            ))
        })?;
        Ok(ScheduledTask::new(NEWS_TASK_ID, "Daily news digest", schedule).starting_after(now))
    }

    /// Executor printing each report to stdout.
    pub fn into_executor(self: Arc<Self>) -> TaskExecutor {
        Box::new(move |_task: &ScheduledTask| {
            let job = Arc::clone(&self);
            async move {
                match job.run_once(&now_in_china()).await {
                    Ok((report, path)) => {
                        println!("{report}");
                        TaskResult::Success(format!("report saved to {}", path.display()))
                    }
                    Err(e) => TaskResult::Error(e.to_string()),
                }
            }
            .boxed()
        })
    }
}
