//! wecom-notify: WeChat Work group-robot notification tools.
//!
//! - **Daily reading**: filters a dated reading plan to weekdays and
//!   highlights today's entry ([`reading`])
//! - **Delivery**: posts text or markdown to the robot webhook and
//!   classifies failures ([`webhook`])
//! - **Auto-sender**: paced status reports with pause/resume/stop
//!   ([`sender`])
//! - **Reminders and digests**: a cooperative [`scheduler`] drives the break
//!   [`reminder`] and the daily news digest
//! - **Issue export**: saved filters and CSV export from the issue tracker
//!   ([`jira`])

pub mod alert;
pub mod clock;
pub mod config;
pub mod error;
pub mod jira;
pub mod logging;
pub mod news;
pub mod reading;
pub mod reminder;
pub mod scheduler;
pub mod sender;
pub mod webhook;

pub use config::NotifyConfig;
pub use error::{NotifyError, Result};
pub use webhook::{DeliveryError, MessageKind, MessageSink, WebhookClient};
