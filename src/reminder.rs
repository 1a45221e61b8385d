//! Break reminder, run every few minutes by the [`Scheduler`](crate::scheduler::Scheduler).

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use futures_util::FutureExt;
use tracing::info;

use crate::clock::now_in_china;
use crate::config::ReminderConfig;
use crate::scheduler::{Schedule, ScheduledTask, TaskExecutor, TaskResult};
use crate::webhook::{MessageKind, MessageSink};

/// Task id of the break reminder.
pub const REMINDER_TASK_ID: &str = "break_reminder";

/// Emits the break reminder to a webhook, or to the log when none is set.
pub struct Reminder {
    config: ReminderConfig,
    sink: Option<Arc<dyn MessageSink>>,
}

impl Reminder {
    pub fn new(config: ReminderConfig, sink: Option<Arc<dyn MessageSink>>) -> Self {
        Self { config, sink }
    }

    /// Reminder text: title line, then the message.
    pub fn render(&self) -> String {
        format!("{}\n{}", self.config.title, self.config.message)
    }

    /// Emit one reminder.
    pub async fn remind(&self) -> TaskResult {
        let stamp = now_in_china().format("%H:%M:%S");
        info!("[{stamp}] sending reminder: {}", self.config.title);

        match &self.sink {
            Some(sink) => {
                if sink.send_message(MessageKind::Text, &self.render()).await {
                    TaskResult::Success("reminder delivered".to_owned())
                } else {
                    TaskResult::Error("reminder delivery failed".to_owned())
                }
            }
            None => {
                info!("{}", self.config.message);
                TaskResult::Success("reminder logged".to_owned())
            }
        }
    }

    /// Scheduled task whose first run is one interval after `now`.
    pub fn task(&self, now: &DateTime<FixedOffset>) -> ScheduledTask {
        ScheduledTask::new(
            REMINDER_TASK_ID,
            "Break reminder",
            Schedule::every_minutes(self.config.interval_minutes.max(1)),
        )
        .starting_after(now)
    }

    /// Executor that runs this reminder for [`REMINDER_TASK_ID`].
    pub fn into_executor(self: Arc<Self>) -> TaskExecutor {
        Box::new(move |task: &ScheduledTask| {
            let reminder = Arc::clone(&self);
            let id = task.id.clone();
            async move {
                if id == REMINDER_TASK_ID {
                    reminder.remind().await
                } else {
                    TaskResult::Error(format!("unknown task: {id}"))
                }
            }
            .boxed()
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        messages: Mutex<Vec<(MessageKind, String)>>,
    }

    #[async_trait]
    impl MessageSink for RecordingSink {
        async fn send_message(&self, kind: MessageKind, content: &str) -> bool {
            self.messages.lock().unwrap().push((kind, content.to_owned()));
            true
        }
    }

    #[tokio::test]
    async fn reminder_goes_to_sink_as_text() {
        let sink = Arc::new(RecordingSink::default());
        let reminder = Reminder::new(ReminderConfig::default(), Some(sink.clone() as Arc<dyn MessageSink>));

        assert!(reminder.remind().await.is_success());

        let messages = sink.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, MessageKind::Text);
        assert!(messages[0].1.starts_with("💧 休息时间到！\n"));
        assert!(messages[0].1.contains("补充水分"));
    }

    #[tokio::test]
    async fn reminder_without_sink_is_logged() {
        let reminder = Reminder::new(ReminderConfig::default(), None);
        assert_eq!(
            reminder.remind().await,
            TaskResult::Success("reminder logged".into())
        );
    }

    #[tokio::test]
    async fn executor_runs_through_scheduler() {
        let sink = Arc::new(RecordingSink::default());
        let config = ReminderConfig {
            interval_minutes: 2,
            ..ReminderConfig::default()
        };
        let reminder = Arc::new(Reminder::new(config, Some(sink.clone() as Arc<dyn MessageSink>)));

        let start = crate::clock::china_offset()
            .with_ymd_and_hms(2024, 6, 14, 9, 0, 0)
            .single()
            .unwrap();
        let mut scheduler = crate::scheduler::Scheduler::new()
            .with_executor(Arc::clone(&reminder).into_executor());
        scheduler.add_task(reminder.task(&start));

        // First reminder comes one interval after start.
        assert_eq!(scheduler.tick_at(&(start + chrono::Duration::minutes(1))).await, 0);
        assert_eq!(scheduler.tick_at(&(start + chrono::Duration::minutes(2))).await, 1);
        assert_eq!(sink.messages.lock().unwrap().len(), 1);
    }
}
