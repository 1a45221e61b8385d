//! One daily-reading run: filter the block, then preview or deliver it.
//!
//! [`DailyRun`] carries the outcome, and [`DailyRun::is_success`] decides
//! the process exit status: skipping a weekend or a day without an entry
//! counts as success, while a missing webhook or a refused post is a
//! failure.

use chrono::NaiveDate;
use tracing::{error, info};

use super::{MissingTodayPolicy, ReadingOutcome, filter_daily_reading};
use crate::webhook::{MessageKind, MessageSink};

/// Outcome of [`run_daily_reading`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DailyRun {
    /// Saturday or Sunday, nothing composed.
    Weekend,
    /// No entry dated today and the policy suppresses the message.
    MissingToday,
    /// Dry run: the message was composed but not sent.
    Previewed(String),
    /// The webhook accepted the message.
    Sent(String),
    /// A message was composed but no webhook is configured.
    NoWebhook(String),
    /// The webhook refused the message or could not be reached.
    DeliveryFailed(String),
}

impl DailyRun {
    /// `true` when the run should exit with status 0.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Self::Weekend | Self::MissingToday | Self::Previewed(_) | Self::Sent(_)
        )
    }

    /// The composed message, if one was built.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Previewed(message)
            | Self::Sent(message)
            | Self::NoWebhook(message)
            | Self::DeliveryFailed(message) => Some(message),
            Self::Weekend | Self::MissingToday => None,
        }
    }
}

/// Filter `block` for `today` and send the result to `sink` as markdown.
///
/// With `dry_run` nothing is sent, even when a sink is given.
pub async fn run_daily_reading(
    block: &str,
    today: NaiveDate,
    policy: MissingTodayPolicy,
    sink: Option<&dyn MessageSink>,
    dry_run: bool,
) -> DailyRun {
    let message = match filter_daily_reading(block, today, policy) {
        ReadingOutcome::Weekend => return DailyRun::Weekend,
        ReadingOutcome::MissingToday => return DailyRun::MissingToday,
        ReadingOutcome::Message(message) => message,
    };

    if dry_run {
        info!("dry run, daily reading for {today} not sent");
        return DailyRun::Previewed(message);
    }

    let Some(sink) = sink else {
        error!("daily reading for {today} composed but no webhook is configured");
        return DailyRun::NoWebhook(message);
    };

    if sink.send_message(MessageKind::Markdown, &message).await {
        DailyRun::Sent(message)
    } else {
        DailyRun::DeliveryFailed(message)
    }
}
