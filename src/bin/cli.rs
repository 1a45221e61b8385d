//! CLI binary for wecom-notify.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use wecom_notify::alert::{AlertLevel, format_alert};
use wecom_notify::clock::now_in_china;
use wecom_notify::config::{DEFAULT_CONFIG_FILE, WEBHOOK_ENV_VAR};
use wecom_notify::jira::{self, IssueRow, JiraClient};
use wecom_notify::news::NewsJob;
use wecom_notify::reading::{self, DailyRun, MissingTodayPolicy};
use wecom_notify::reminder::Reminder;
use wecom_notify::scheduler::{Scheduler, TaskExecutor};
use wecom_notify::sender::{AutoSender, spawn_line_reader};
use wecom_notify::{MessageKind, MessageSink, NotifyConfig, WebhookClient};

/// WeChat Work group-robot notifications: daily reading, alerts, paced
/// reports, reminders, news digests and issue exports.
#[derive(Parser)]
#[command(name = "wecom-notify", version, about)]
struct Cli {
    /// Path to the YAML (or `.toml` / `.ini`) configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Send one message to the webhook.
    Send {
        /// Message type: text or markdown.
        #[arg(short = 't', long = "type", default_value = "text")]
        kind: MessageKind,
        /// Message content.
        content: String,
    },

    /// Send a markdown alert.
    Alert {
        /// Alert title.
        #[arg(long)]
        title: String,
        /// Alert level: info, warning or error.
        #[arg(long, default_value = "info")]
        level: String,
        /// Alert details.
        content: String,
    },

    /// Send today's reading entries, highlighted; nothing on weekends.
    DailyReading {
        /// First line of the message.
        #[arg(long, default_value = reading::DEFAULT_TITLE)]
        title: String,
        /// File with one `<M>月<D>日 <content> <from>-<to>` entry per line.
        #[arg(long)]
        plan: Option<PathBuf>,
        /// Reference date (YYYY-MM-DD) instead of today in UTC+8.
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Send the weekday entries even when none is dated today.
        #[arg(long)]
        send_without_today: bool,
        /// Print the message without sending it.
        #[arg(long)]
        dry_run: bool,
    },

    /// Send a status report every interval until stopped (p = pause/resume, q = quit).
    Auto {
        /// Seconds between reports.
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,
    },

    /// Remind to take a break every few minutes.
    Remind {
        /// Minutes between reminders.
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,
    },

    /// Fetch the news digest and save it as news_YYYYMMDD.txt.
    News {
        /// Keep running and fetch again every day.
        #[arg(long)]
        schedule: bool,
        /// Daily run time (HH:MM, UTC+8) with --schedule.
        #[arg(long)]
        at: Option<String>,
        /// Directory for the report file.
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Issue-tracker export.
    Jira {
        #[command(subcommand)]
        command: JiraCommand,
    },
}

#[derive(Subcommand)]
enum JiraCommand {
    /// List favourite filters.
    Filters,

    /// Dump field definitions to a text file.
    Fields {
        #[arg(short, long, default_value = "output.txt")]
        output: PathBuf,
    },

    /// Export the issues of a filter (chosen interactively unless --jql is given) to CSV.
    Export {
        /// JQL query to export instead of picking a favourite filter.
        #[arg(long)]
        jql: Option<String>,
        #[arg(short, long, default_value = "jira_issues.csv")]
        output: PathBuf,
    },
}

/// Exit status after a second Ctrl+C while shutting down.
const FORCED_EXIT_CODE: i32 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // The issue-tracker commands cannot work without credentials, so for
    // them a missing file is an error instead of a warning.
    let requires_file = matches!(cli.command, Command::Jira { .. });
    let config = wecom_notify::logging::with_startup_logging(|| {
        let loaded = if requires_file {
            NotifyConfig::from_file(&cli.config)
        } else {
            NotifyConfig::load_or_default(&cli.config)
        };
        loaded.map_err(|e| error!("{e}")).ok()
    });
    let Some(config) = config else {
        return ExitCode::FAILURE;
    };

    if let Err(e) = wecom_notify::logging::init_logging(&config.logging) {
        eprintln!("warning: {e}");
    }

    match run(cli.command, &config).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: &NotifyConfig) -> anyhow::Result<ExitCode> {
    match command {
        Command::Send { kind, content } => {
            let Some(client) = webhook_client(config)? else {
                return Ok(ExitCode::FAILURE);
            };
            Ok(exit_for(client.send(kind, &content).await))
        }
        Command::Alert {
            title,
            level,
            content,
        } => {
            let Some(client) = webhook_client(config)? else {
                return Ok(ExitCode::FAILURE);
            };
            let text = format_alert(&title, &content, AlertLevel::parse_lenient(&level), &now_in_china());
            Ok(exit_for(client.send(MessageKind::Markdown, &text).await))
        }
        Command::DailyReading {
            title,
            plan,
            date,
            send_without_today,
            dry_run,
        } => {
            let policy = if send_without_today {
                MissingTodayPolicy::Send
            } else {
                MissingTodayPolicy::Suppress
            };
            run_daily_reading(config, &title, plan.as_deref(), date, policy, dry_run).await
        }
        Command::Auto { interval } => {
            let Some(client) = webhook_client(config)? else {
                return Ok(ExitCode::FAILURE);
            };
            run_auto(client, interval.unwrap_or(config.sender.interval_secs)).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Remind { interval } => {
            let mut settings = config.reminder.clone();
            if let Some(minutes) = interval {
                settings.interval_minutes = minutes;
            }
            let sink: Option<Arc<dyn MessageSink>> = match config.resolve_webhook_url() {
                Some(url) => Some(Arc::new(WebhookClient::new(url)?) as Arc<dyn MessageSink>),
                None => {
                    info!("no webhook URL configured, reminders go to the log");
                    None
                }
            };
            println!(
                "⏰ 健康提醒小助手已启动！每 {} 分钟提醒一次，按 Ctrl+C 退出。",
                settings.interval_minutes
            );

            let reminder = Arc::new(Reminder::new(settings, sink));
            let task = reminder.task(&now_in_china());
            run_scheduled(Arc::clone(&reminder).into_executor(), task).await;
            Ok(ExitCode::SUCCESS)
        }
        Command::News {
            schedule,
            at,
            output_dir,
        } => {
            let mut settings = config.news.clone();
            if let Some(at) = at {
                settings.daily_at = at;
            }
            if let Some(dir) = output_dir {
                settings.output_dir = dir;
            }
            run_news(settings, schedule).await
        }
        Command::Jira { command } => run_jira(config, command).await,
    }
}

fn exit_for(sent: bool) -> ExitCode {
    if sent { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

/// Webhook client, or `None` (logged) when no URL is configured.
fn webhook_client(config: &NotifyConfig) -> anyhow::Result<Option<WebhookClient>> {
    match config.resolve_webhook_url() {
        Some(url) => Ok(Some(WebhookClient::new(url)?)),
        None => {
            error!("no webhook URL configured; set wechat_work.webhook_url or {WEBHOOK_ENV_VAR}");
            Ok(None)
        }
    }
}

async fn run_daily_reading(
    config: &NotifyConfig,
    title: &str,
    plan: Option<&Path>,
    date: Option<NaiveDate>,
    policy: MissingTodayPolicy,
    dry_run: bool,
) -> anyhow::Result<ExitCode> {
    let entries = match plan {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("cannot read plan file {}", path.display()))?,
        None => reading::DEFAULT_PLAN.to_owned(),
    };

    let now = now_in_china();
    let today = date.unwrap_or_else(|| now.date_naive());
    let block = reading::compose_reading_block(title, &now, &entries);

    let client = match config.resolve_webhook_url() {
        Some(url) => Some(WebhookClient::new(url)?),
        None => None,
    };
    let sink = client.as_ref().map(|client| client as &dyn MessageSink);
    let outcome = reading::run_daily_reading(&block, today, policy, sink, dry_run).await;

    match &outcome {
        DailyRun::Weekend => println!("{today} 是周末，无需发送。"),
        DailyRun::MissingToday => println!("{today} 没有对应的早读内容，无需发送。"),
        DailyRun::NoWebhook(message) => {
            println!("{message}");
            info!("set wechat_work.webhook_url or {WEBHOOK_ENV_VAR} to deliver it");
        }
        DailyRun::Previewed(message) | DailyRun::Sent(message) | DailyRun::DeliveryFailed(message) => {
            println!("{message}");
        }
    }
    Ok(exit_for(outcome.is_success()))
}

async fn run_auto(client: WebhookClient, interval_secs: u64) -> anyhow::Result<()> {
    let sender = AutoSender::new(interval_secs);
    let handle = sender.handle();

    println!(
        "🚀 自动发送已启动，间隔 {} 秒。输入 p 暂停/继续，q 退出。",
        sender.interval()
    );

    // Blocking stdin reads happen on their own thread so that a pending
    // read never delays exit once the sender has stopped.
    let lines = spawn_line_reader(std::io::BufReader::new(std::io::stdin()))
        .context("cannot start the command reader")?;

    let on_signal = handle.clone();
    let signals = spawn_ctrl_c(move || {
        on_signal.stop();
    });

    sender.run_controlled(&client, lines).await;
    signals.abort();
    println!("共发送 {} 条报告。", handle.counter());
    Ok(())
}

/// Call `on_first` on the first Ctrl+C and exit the process on the second.
fn spawn_ctrl_c(on_first: impl FnOnce() + Send + 'static) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        info!("received Ctrl+C, shutting down (press again to exit now)");
        on_first();

        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("received second Ctrl+C, exiting");
            std::process::exit(FORCED_EXIT_CODE);
        }
    })
}

/// Run one scheduled task until Ctrl+C.
async fn run_scheduled(executor: TaskExecutor, task: wecom_notify::scheduler::ScheduledTask) {
    let mut scheduler = Scheduler::new().with_executor(executor);
    info!("{} scheduled {}", task.name, task.schedule);
    scheduler.add_task(task);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    let signals = spawn_ctrl_c(move || on_signal.cancel());

    scheduler.run(cancel).await;
    signals.abort();
}

async fn run_news(settings: wecom_notify::config::NewsSettings, schedule: bool) -> anyhow::Result<ExitCode> {
    let job = Arc::new(NewsJob::new(settings));
    let now = now_in_china();

    // Validate the daily time before the first fetch.
    let task = if schedule { Some(job.task(&now)?) } else { None };

    let (report, path) = job.run_once(&now).await?;
    println!("{report}");
    println!("✅ 新闻已保存到: {}", path.display());

    if let Some(task) = task {
        println!("📅 定时任务已启动，{}，按 Ctrl+C 停止。", task.schedule);
        run_scheduled(Arc::clone(&job).into_executor(), task).await;
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_jira(config: &NotifyConfig, command: JiraCommand) -> anyhow::Result<ExitCode> {
    let client = JiraClient::new(&config.jira)?;
    println!("JIRA服务器: {}", client.server());
    let user = client.myself().await?;
    println!("登录成功! 用户名: {}", user.display_name);
    println!("邮箱: {}", user.email_address);

    match command {
        JiraCommand::Filters => {
            let filters = client.favourite_filters().await?;
            println!("📋 所有过滤器:");
            for (index, filter) in filters.iter().enumerate() {
                println!("{:>2}. {}", index + 1, filter.name);
                println!("    JQL: {}", filter.jql);
            }
        }
        JiraCommand::Fields { output } => {
            let fields = client.fields().await?;
            jira::write_fields_dump(&output, &fields, &now_in_china())?;
            println!("数据已保存到 {}", output.display());
        }
        JiraCommand::Export { jql, output } => {
            let jql = match jql {
                Some(jql) => jql,
                None => {
                    let filters = client.favourite_filters().await?;
                    let stdin = std::io::stdin();
                    let mut input = stdin.lock();
                    let mut out = std::io::stdout();
                    match jira::select_filter(&filters, &mut input, &mut out)? {
                        Some(filter) => filter.jql.clone(),
                        None => return Ok(ExitCode::SUCCESS),
                    }
                }
            };

            let issues = client.search_issues(&jql).await?;
            let rows: Vec<IssueRow> = issues.iter().map(IssueRow::from_issue).collect();
            let count = jira::export_issues_csv(&rows, &config.jira.browse_url_prefix(), &output)?;
            println!("{count} 条数据已导出到: {}", output.display());
        }
    }
    Ok(ExitCode::SUCCESS)
}
