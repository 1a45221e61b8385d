//! Scheduler loop.
//!
//! Ticks on a fixed cadence, runs every due task once per tick through the
//! registered executor and, when a result channel is attached, forwards each
//! [`TaskResult`] on it. Tasks run one after another, never in parallel.

use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use futures_util::future::BoxFuture;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::now_in_china;
use crate::scheduler::tasks::{ScheduledTask, TaskResult, TaskRunRecord};

/// Default interval between scheduler ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Number of run-history entries to keep.
const DEFAULT_HISTORY_LIMIT: usize = 400;

/// Callback type for executing a task.
///
/// Takes the scheduled task and returns a future resolving to its
/// [`TaskResult`].
pub type TaskExecutor =
    Box<dyn Fn(&ScheduledTask) -> BoxFuture<'static, TaskResult> + Send + Sync>;

/// Cooperative scheduler for periodic tasks.
pub struct Scheduler {
    /// Registered tasks.
    tasks: Vec<ScheduledTask>,
    /// Recent run history, oldest first.
    history: Vec<TaskRunRecord>,
    /// Optional channel for task results.
    result_tx: Option<mpsc::UnboundedSender<TaskResult>>,
    /// Task executor callback.
    executor: Option<TaskExecutor>,
    /// Max history entries kept in memory.
    max_history_entries: usize,
    /// Time between ticks in [`Scheduler::run`].
    tick_interval: Duration,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Create a scheduler with no tasks and no result channel.
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            history: Vec::new(),
            result_tx: None,
            executor: None,
            max_history_entries: DEFAULT_HISTORY_LIMIT,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    /// Set the executor callback for running tasks.
    pub fn with_executor(mut self, executor: TaskExecutor) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Forward every [`TaskResult`] on `result_tx`.
    ///
    /// The receiver must be drained; results queue up until it is read or
    /// dropped.
    pub fn with_results(mut self, result_tx: mpsc::UnboundedSender<TaskResult>) -> Self {
        self.result_tx = Some(result_tx);
        self
    }

    /// Override the tick cadence.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Add (or replace) a task.
    pub fn add_task(&mut self, task: ScheduledTask) {
        if let Some(existing) = self.tasks.iter_mut().find(|t| t.id == task.id) {
            *existing = task;
        } else {
            self.tasks.push(task);
        }
    }

    /// Returns registered tasks.
    pub fn tasks(&self) -> &[ScheduledTask] {
        &self.tasks
    }

    /// Returns scheduler run history.
    pub fn history(&self) -> &[TaskRunRecord] {
        &self.history
    }

    /// Run the loop until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!("scheduler started with {} tasks", self.tasks.len());
        for task in &self.tasks {
            debug!("task {} ({}): {}", task.id, task.name, task.schedule);
        }

        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = interval.tick() => {
                    self.tick_at(&now_in_china()).await;
                }
            }
        }

        info!("scheduler stopped");
    }

    /// Execute one tick: run every task due at `now`. Returns how many ran.
    pub async fn tick_at(&mut self, now: &DateTime<FixedOffset>) -> usize {
        let due: Vec<ScheduledTask> = self
            .tasks
            .iter()
            .filter(|t| t.is_due_at(now))
            .cloned()
            .collect();

        for task_snapshot in &due {
            debug!("running task {}", task_snapshot.id);
            let started_at = now.timestamp();
            let result = self.execute_task(task_snapshot).await;
            let finished_at = now_in_china().timestamp().max(started_at);

            if let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_snapshot.id) {
                task.mark_run_at(now);
            }

            match &result {
                TaskResult::Success(summary) => info!("task {}: {summary}", task_snapshot.id),
                TaskResult::Error(err) => warn!("task {} failed: {err}", task_snapshot.id),
            }

            self.push_history(TaskRunRecord {
                task_id: task_snapshot.id.clone(),
                started_at,
                finished_at,
                success: result.is_success(),
                summary: result.summary().to_owned(),
            });

            if let Some(tx) = &self.result_tx {
                if tx.send(result).is_err() {
                    debug!("scheduler result channel closed");
                }
            }
        }

        due.len()
    }

    async fn execute_task(&self, task: &ScheduledTask) -> TaskResult {
        match &self.executor {
            Some(executor) => executor(task).await,
            None => TaskResult::Error(format!("no executor registered for task {}", task.id)),
        }
    }

    fn push_history(&mut self, run: TaskRunRecord) {
        self.history.push(run);
        if self.history.len() > self.max_history_entries {
            let overflow = self.history.len() - self.max_history_entries;
            self.history.drain(..overflow);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::scheduler::tasks::Schedule;
    use chrono::TimeZone;
    use futures_util::FutureExt;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn at(h: u32, m: u32, s: u32) -> DateTime<FixedOffset> {
        crate::clock::china_offset()
            .with_ymd_and_hms(2024, 6, 14, h, m, s)
            .single()
            .unwrap()
    }

    fn echo_executor() -> TaskExecutor {
        Box::new(|task: &ScheduledTask| {
            let id = task.id.clone();
            async move {
                if id == "broken" {
                    TaskResult::Error("boom".into())
                } else {
                    TaskResult::Success(format!("ran {id}"))
                }
            }
            .boxed()
        })
    }

    #[tokio::test]
    async fn tick_runs_only_due_tasks() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = Scheduler::new()
            .with_executor(echo_executor())
            .with_results(tx);
        scheduler.add_task(ScheduledTask::new("a", "A", Schedule::Interval { secs: 60 }));
        scheduler.add_task(ScheduledTask::new("b", "B", Schedule::Daily { hour: 10, min: 0 }));

        assert_eq!(scheduler.tick_at(&at(9, 0, 0)).await, 1);
        assert_eq!(rx.recv().await, Some(TaskResult::Success("ran a".into())));

        // Interval not elapsed yet; daily not reached.
        assert_eq!(scheduler.tick_at(&at(9, 0, 30)).await, 0);

        assert_eq!(scheduler.tick_at(&at(10, 0, 0)).await, 2);
        assert_eq!(scheduler.history().len(), 3);
    }

    #[tokio::test]
    async fn failures_are_recorded_and_task_still_marked_run() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = Scheduler::new()
            .with_executor(echo_executor())
            .with_results(tx);
        scheduler.add_task(ScheduledTask::new("broken", "Broken", Schedule::Interval { secs: 60 }));

        scheduler.tick_at(&at(9, 0, 0)).await;
        assert_eq!(rx.recv().await, Some(TaskResult::Error("boom".into())));

        let record = &scheduler.history()[0];
        assert_eq!(record.task_id, "broken");
        assert!(!record.success);
        assert_eq!(record.summary, "boom");

        // No immediate retry.
        assert_eq!(scheduler.tick_at(&at(9, 0, 10)).await, 0);
    }

    #[tokio::test]
    async fn missing_executor_reports_error() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = Scheduler::new().with_results(tx);
        scheduler.add_task(ScheduledTask::new("a", "A", Schedule::Interval { secs: 60 }));

        scheduler.tick_at(&at(9, 0, 0)).await;
        let result = rx.recv().await.unwrap();
        assert!(result.summary().contains("no executor"));
    }

    #[tokio::test]
    async fn history_is_bounded() {
        let mut scheduler = Scheduler::new().with_executor(echo_executor());
        scheduler.add_task(ScheduledTask::new("a", "A", Schedule::Interval { secs: 1 }));

        let start = at(9, 0, 0);
        let runs = i64::try_from(DEFAULT_HISTORY_LIMIT).unwrap() + 5;
        for s in 0..runs {
            scheduler.tick_at(&(start + chrono::Duration::seconds(s))).await;
        }
        assert_eq!(scheduler.history().len(), DEFAULT_HISTORY_LIMIT);
        let last = scheduler.history().last().unwrap();
        assert_eq!(last.started_at, start.timestamp() + runs - 1);
    }

    #[tokio::test]
    async fn runs_without_result_channel() {
        let mut scheduler = Scheduler::new().with_executor(echo_executor());
        scheduler.add_task(ScheduledTask::new("a", "A", Schedule::Interval { secs: 60 }));

        assert_eq!(scheduler.tick_at(&at(9, 0, 0)).await, 1);
        assert_eq!(scheduler.tick_at(&at(9, 1, 0)).await, 1);
        assert_eq!(scheduler.history().len(), 2);
        assert!(scheduler.history().iter().all(|r| r.success));
    }

    #[tokio::test]
    async fn dropped_receiver_does_not_stop_ticks() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let mut scheduler = Scheduler::new()
            .with_executor(echo_executor())
            .with_results(tx);
        scheduler.add_task(ScheduledTask::new("a", "A", Schedule::Interval { secs: 60 }));

        assert_eq!(scheduler.tick_at(&at(9, 0, 0)).await, 1);
        assert_eq!(scheduler.history().len(), 1);
    }

    #[tokio::test]
    async fn add_task_replaces_same_id() {
        let mut scheduler = Scheduler::new().with_executor(echo_executor());
        scheduler.add_task(ScheduledTask::new("a", "A", Schedule::Interval { secs: 60 }));
        scheduler.add_task(ScheduledTask::new("a", "A2", Schedule::Interval { secs: 30 }));
        assert_eq!(scheduler.tasks().len(), 1);
        assert_eq!(scheduler.tasks()[0].name, "A2");
        assert_eq!(scheduler.tasks()[0].schedule, Schedule::Interval { secs: 30 });
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let executor: TaskExecutor = Box::new(move |_task: &ScheduledTask| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                TaskResult::Success("ok".into())
            }
            .boxed()
        });

        let mut scheduler = Scheduler::new()
            .with_executor(executor)
            .with_tick_interval(Duration::from_millis(10));
        scheduler.add_task(ScheduledTask::new("a", "A", Schedule::Interval { secs: 3600 }));

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(scheduler.run(cancel.clone()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("scheduler exits after cancel")
            .unwrap();

        // First tick ran the never-run task; the hour interval kept it idle after.
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
