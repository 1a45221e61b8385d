//! Line-oriented control commands for the auto-sender.
//!
//! Commands arrive one per line, either from an async reader or from a
//! channel fed by [`spawn_line_reader`]. The CLI uses the channel form for
//! stdin: a blocking read on a plain thread never holds up runtime shutdown.
//! End of input stops the sender, and both readers return as soon as the
//! sender is stopped by any other means.

use std::io::BufRead;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::SenderHandle;

/// Lines buffered between the reader thread and the command loop.
const LINE_BUFFER: usize = 16;

/// A control command typed by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderCommand {
    /// `p`: flip between paused and running.
    TogglePause,
    /// `pause`
    Pause,
    /// `resume`
    Resume,
    /// `q`, `quit` or `stop`
    Stop,
}

impl SenderCommand {
    /// Parse one input line; case and surrounding whitespace are ignored.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "p" => Some(Self::TogglePause),
            "pause" => Some(Self::Pause),
            "resume" => Some(Self::Resume),
            "q" | "quit" | "stop" => Some(Self::Stop),
            _ => None,
        }
    }

    /// Apply the command. Returns whether the state changed.
    pub fn apply(self, handle: &SenderHandle) -> bool {
        match self {
            Self::TogglePause => {
                handle.toggle_pause();
                true
            }
            Self::Pause => handle.pause(),
            Self::Resume => handle.resume(),
            Self::Stop => handle.stop(),
        }
    }
}

fn apply_line(line: &str, handle: &SenderHandle) {
    if line.trim().is_empty() {
        return;
    }
    match SenderCommand::parse(line) {
        Some(command) => {
            debug!(?command, "control command");
            command.apply(handle);
        }
        None => warn!(
            "unknown command {:?}; use 'p' to pause/resume or 'q' to quit",
            line.trim()
        ),
    }
}

/// Apply commands from `reader` until it ends or the sender stops.
///
/// EOF and read errors stop the sender as well.
pub async fn run_command_reader<R>(reader: R, handle: SenderHandle)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    while handle.is_running() {
        tokio::select! {
            () = handle.stopped() => break,
            line = lines.next_line() => match line {
                Ok(Some(line)) => apply_line(&line, &handle),
                Ok(None) => {
                    debug!("command input closed");
                    handle.stop();
                }
                Err(e) => {
                    warn!("failed to read command input: {e}");
                    handle.stop();
                }
            },
        }
    }
}

/// Apply commands received on `lines` until the channel closes or the
/// sender stops. A closed channel stops the sender.
pub async fn run_command_channel(mut lines: mpsc::Receiver<String>, handle: SenderHandle) {
    while handle.is_running() {
        tokio::select! {
            () = handle.stopped() => break,
            line = lines.recv() => match line {
                Some(line) => apply_line(&line, &handle),
                None => {
                    debug!("command input closed");
                    handle.stop();
                }
            },
        }
    }
}

/// Read `reader` line by line on a dedicated thread and forward each line.
///
/// The channel closes when the reader hits EOF or an error, or when the
/// receiving side is dropped and the next line arrives. The thread is
/// detached; a read that never returns does not keep the process alive.
///
/// # Errors
///
/// Returns an error if the thread cannot be spawned.
pub fn spawn_line_reader<R>(reader: R) -> std::io::Result<mpsc::Receiver<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(LINE_BUFFER);
    std::thread::Builder::new()
        .name("sender-commands".to_owned())
        .spawn(move || {
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("failed to read command input: {e}");
                        break;
                    }
                }
            }
        })?;
    Ok(rx)
}
