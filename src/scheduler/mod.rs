//! Background task scheduler.
//!
//! Drives the break reminder and the daily news digest.

pub mod runner;
pub mod tasks;

pub use runner::{Scheduler, TaskExecutor};
pub use tasks::{Schedule, ScheduledTask, TaskResult, TaskRunRecord};
