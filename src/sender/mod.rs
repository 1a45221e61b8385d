//! Paced auto-sender: a status report every `interval` ticks, controllable
//! from another task through a [`SenderHandle`].
//!
//! The run-state lives behind a mutex shared by the send loop and the
//! command reader. Control is cooperative: `pause` and `stop` are observed
//! by the loop on its next tick.

pub mod commands;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::alert::{AlertLevel, format_alert};
use crate::clock::{format_timestamp, now_in_china};
use crate::webhook::{MessageKind, MessageSink};

pub use commands::{SenderCommand, run_command_channel, run_command_reader, spawn_line_reader};

/// Length of one wait tick in production.
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Mutable run-state of an [`AutoSender`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunState {
    /// Cleared by [`SenderHandle::stop`]; the loop exits once it sees it.
    pub running: bool,
    /// While set, no report is sent and the interval countdown is frozen.
    pub paused: bool,
    /// Number of reports attempted so far.
    pub counter: u64,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            running: true,
            paused: false,
            counter: 0,
        }
    }
}

/// Cloneable control handle for a running [`AutoSender`].
#[derive(Debug, Clone, Default)]
pub struct SenderHandle {
    state: Arc<Mutex<RunState>>,
    /// Cancelled once by [`SenderHandle::stop`].
    stopped: CancellationToken,
}

impl SenderHandle {
    fn with_state<T>(&self, f: impl FnOnce(&mut RunState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> RunState {
        self.with_state(|state| *state)
    }

    pub fn is_paused(&self) -> bool {
        self.with_state(|state| state.paused)
    }

    pub fn is_running(&self) -> bool {
        self.with_state(|state| state.running)
    }

    pub fn counter(&self) -> u64 {
        self.with_state(|state| state.counter)
    }

    /// Pause sending. Returns `false` if already paused.
    pub fn pause(&self) -> bool {
        let changed = self.with_state(|state| !std::mem::replace(&mut state.paused, true));
        if changed {
            info!("[{}] sending paused", format_timestamp(&now_in_china()));
        }
        changed
    }

    /// Resume sending. Returns `false` if not paused.
    pub fn resume(&self) -> bool {
        let changed = self.with_state(|state| std::mem::replace(&mut state.paused, false));
        if changed {
            info!("[{}] sending resumed", format_timestamp(&now_in_china()));
        }
        changed
    }

    /// Flip the paused flag. Returns the new paused value.
    pub fn toggle_pause(&self) -> bool {
        let paused = self.with_state(|state| {
            state.paused = !state.paused;
            state.paused
        });
        let status = if paused { "paused" } else { "resumed" };
        info!("[{}] sending {status}", format_timestamp(&now_in_china()));
        paused
    }

    /// Ask the loop to exit. Returns `false` if already stopping.
    pub fn stop(&self) -> bool {
        let changed = self.with_state(|state| std::mem::replace(&mut state.running, false));
        self.stopped.cancel();
        if changed {
            info!("[{}] stopping auto sender", format_timestamp(&now_in_china()));
        }
        changed
    }

    /// Completes once [`SenderHandle::stop`] has been called.
    pub async fn stopped(&self) {
        self.stopped.cancelled().await;
    }

    fn next_counter(&self) -> u64 {
        self.with_state(|state| {
            state.counter += 1;
            state.counter
        })
    }
}

/// Sends a status report every `interval` ticks until stopped.
#[derive(Debug)]
pub struct AutoSender {
    interval: u64,
    tick: Duration,
    handle: SenderHandle,
}

impl AutoSender {
    /// Sender reporting every `interval_secs` seconds (at least one).
    pub fn new(interval_secs: u64) -> Self {
        if interval_secs == 0 {
            warn!("auto sender interval of 0 raised to 1");
        }
        Self {
            interval: interval_secs.max(1),
            tick: DEFAULT_TICK,
            handle: SenderHandle::default(),
        }
    }

    /// Override the tick length; the interval is counted in ticks.
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Interval between reports, in ticks.
    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// Control handle sharing this sender's state.
    pub fn handle(&self) -> SenderHandle {
        self.handle.clone()
    }

    pub fn pause(&self) -> bool {
        self.handle.pause()
    }

    pub fn resume(&self) -> bool {
        self.handle.resume()
    }

    pub fn toggle_pause(&self) -> bool {
        self.handle.toggle_pause()
    }

    pub fn stop(&self) -> bool {
        self.handle.stop()
    }

    pub fn is_paused(&self) -> bool {
        self.handle.is_paused()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_running()
    }

    pub fn counter(&self) -> u64 {
        self.handle.counter()
    }

    /// Run the send loop until [`SenderHandle::stop`] is called.
    ///
    /// A failed send is logged and not retried; the next report goes out
    /// after the regular interval.
    pub async fn run(&self, sink: &dyn MessageSink) {
        info!("auto sender started, interval {} ticks of {:?}", self.interval, self.tick);

        while self.handle.is_running() {
            if self.handle.is_paused() {
                tokio::time::sleep(self.tick).await;
                continue;
            }

            let counter = self.handle.next_counter();
            let now = now_in_china();
            let report = build_status_report(counter, &now, self.interval);
            let stamp = format_timestamp(&now);

            if sink.send_message(MessageKind::Markdown, &report).await {
                info!("[{stamp}] report #{counter} sent, next in {} ticks", self.interval);
            } else {
                warn!("[{stamp}] report #{counter} failed, next attempt in {} ticks", self.interval);
            }

            self.wait_interval().await;
        }

        info!("auto sender stopped after {} reports", self.handle.counter());
    }

    /// Run the send loop together with a command reader fed by `lines`.
    ///
    /// Returns once the sender stops, whether through a command, the end of
    /// `lines` or [`SenderHandle::stop`] from elsewhere. An open `lines`
    /// sender does not keep this from returning.
    pub async fn run_controlled(&self, sink: &dyn MessageSink, lines: mpsc::Receiver<String>) {
        tokio::join!(self.run(sink), run_command_channel(lines, self.handle()));
    }

    /// Wait `interval` ticks, freezing the countdown while paused.
    async fn wait_interval(&self) {
        let mut remaining = self.interval;
        while remaining > 0 && self.handle.is_running() {
            tokio::time::sleep(self.tick).await;
            remaining -= 1;

            if self.handle.is_paused() {
                info!("sending paused, {remaining} ticks of wait remaining");
                while self.handle.is_paused() && self.handle.is_running() {
                    tokio::time::sleep(self.tick).await;
                }
            }
        }
    }
}

/// Markdown status report for report number `counter`.
pub fn build_status_report(counter: u64, now: &DateTime<FixedOffset>, interval: u64) -> String {
    let title = format!("定时监控报告 #{counter}");
    let content = format!(
        "\n这是第 {counter} 次定时报告\n发送时间: {}\n间隔时间: {interval}秒\n系统运行正常，持续监控中...\n",
        format_timestamp(now)
    );
    format_alert(&title, &content, AlertLevel::Info, now)
}
