//! Scheduled task definitions.
//!
//! Defines the [`ScheduledTask`] type and the [`Schedule`] enum for timing.
//! Wall-clock schedules are evaluated in the offset of the `now` they are
//! given, which is UTC+8 everywhere in this crate.

use chrono::{DateTime, FixedOffset, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// How often a task should run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Schedule {
    /// Run every N seconds.
    Interval {
        /// Interval in seconds between runs.
        secs: u64,
    },
    /// Run once daily at a given local hour and minute.
    Daily {
        /// Hour of day (0-23).
        hour: u8,
        /// Minute of hour (0-59).
        min: u8,
    },
}

impl Schedule {
    /// Parse an `HH:MM` time of day into a daily schedule.
    pub fn daily_at(time: &str) -> Option<Self> {
        let parsed = NaiveTime::parse_from_str(time.trim(), "%H:%M").ok()?;
        let hour = u8::try_from(parsed.hour()).ok()?;
        let min = u8::try_from(parsed.minute()).ok()?;
        Some(Self::Daily { hour, min })
    }

    /// Every `minutes` minutes.
    pub fn every_minutes(minutes: u64) -> Self {
        Self::Interval {
            secs: minutes.saturating_mul(60),
        }
    }
}

impl std::fmt::Display for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interval { secs } => {
                if *secs >= 3600 {
                    write!(f, "every {} hours", secs / 3600)
                } else if *secs >= 60 {
                    write!(f, "every {} minutes", secs / 60)
                } else {
                    write!(f, "every {secs} seconds")
                }
            }
            Self::Daily { hour, min } => write!(f, "daily at {hour:02}:{min:02}"),
        }
    }
}

/// Outcome of executing a scheduled task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    /// Task completed with a summary message.
    Success(String),
    /// Task failed with an error message.
    Error(String),
}

impl TaskResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The summary or error message.
    pub fn summary(&self) -> &str {
        match self {
            Self::Success(msg) | Self::Error(msg) => msg,
        }
    }
}

/// One entry of the scheduler's run history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRunRecord {
    pub task_id: String,
    /// Unix epoch seconds.
    pub started_at: i64,
    /// Unix epoch seconds.
    pub finished_at: i64,
    pub success: bool,
    pub summary: String,
}

/// A task that runs on a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    /// Unique task identifier (e.g. `"break_reminder"`).
    pub id: String,
    /// Human-readable task name.
    pub name: String,
    /// When to run this task.
    pub schedule: Schedule,
    /// Unix epoch seconds of the last run, if any.
    pub last_run: Option<i64>,
}

impl ScheduledTask {
    /// Create a task that has never run.
    pub fn new(id: impl Into<String>, name: impl Into<String>, schedule: Schedule) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            schedule,
            last_run: None,
        }
    }

    /// Treat the task as having just run at `now`, so its first run is one
    /// full period away.
    pub fn starting_after(mut self, now: &DateTime<FixedOffset>) -> Self {
        self.mark_run_at(now);
        self
    }

    /// Returns `true` if the task is due at `now`.
    ///
    /// A task that never ran is due immediately; a daily task only once its
    /// time of day has passed.
    pub fn is_due_at(&self, now: &DateTime<FixedOffset>) -> bool {
        let now_ts = now.timestamp();

        match &self.schedule {
            Schedule::Interval { secs } => match self.last_run {
                None => true,
                Some(last) => {
                    let elapsed = u64::try_from(now_ts.saturating_sub(last)).unwrap_or(0);
                    elapsed >= *secs
                }
            },
            Schedule::Daily { hour, min } => {
                let Some(scheduled) = today_at(now, *hour, *min) else {
                    return false;
                };

                match self.last_run {
                    None => now_ts >= scheduled,
                    Some(last) => last < scheduled && now_ts >= scheduled,
                }
            }
        }
    }

    /// Record that the task ran at `now`.
    pub fn mark_run_at(&mut self, now: &DateTime<FixedOffset>) {
        self.last_run = Some(now.timestamp());
    }
}

/// Epoch seconds of `hour:min` on `now`'s calendar day, in `now`'s offset.
fn today_at(now: &DateTime<FixedOffset>, hour: u8, min: u8) -> Option<i64> {
    let local = now
        .date_naive()
        .and_hms_opt(u32::from(hour), u32::from(min), 0)?;
    local
        .and_local_timezone(*now.offset())
        .single()
        .map(|dt| dt.timestamp())
}
