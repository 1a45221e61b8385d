//! End-to-end: compose the reading block, filter it for a date and deliver
//! the result to a mock webhook.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{NaiveDate, TimeZone};
use serde_json::json;
use wecom_notify::clock::china_offset;
use wecom_notify::reading::{
    DEFAULT_TITLE, DailyRun, HIGHLIGHT_END, HIGHLIGHT_START, MissingTodayPolicy,
    compose_reading_block, process_daily_reading, run_daily_reading,
};
use wecom_notify::{DeliveryError, MessageKind, MessageSink, NotifyConfig, WebhookClient};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PLAN: &str = "6月13日 循循善诱 8-9\n6月14日 因材施教 10-12\n6月15日 周末 13-14\n6月17日 温故知新 15-16\n";

fn block_sent_at(day: u32) -> (String, NaiveDate) {
    let now = china_offset()
        .with_ymd_and_hms(2024, 6, day, 8, 30, 0)
        .single()
        .unwrap();
    (
        compose_reading_block(DEFAULT_TITLE, &now, PLAN),
        now.date_naive(),
    )
}

#[tokio::test]
async fn friday_reading_is_delivered_with_highlight() {
    let (block, today) = block_sent_at(14);
    let message = process_daily_reading(&block, today, MissingTodayPolicy::Suppress);
    assert!(message.contains(&format!(
        "{HIGHLIGHT_START}6月14日 因材施教 10-12{HIGHLIGHT_END}"
    )));
    assert!(!message.contains("周末"));

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "msgtype": "markdown",
            "markdown": {"content": message.clone()}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errcode": 0, "errmsg": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = WebhookClient::new(server.uri()).unwrap();
    assert!(client.send(MessageKind::Markdown, &message).await);
}

#[tokio::test]
async fn saturday_sends_nothing() {
    let (block, today) = block_sent_at(15);
    assert_eq!(
        process_daily_reading(&block, today, MissingTodayPolicy::Suppress),
        ""
    );
}

#[tokio::test]
async fn rejected_delivery_reports_failure() {
    let (block, today) = block_sent_at(14);
    let message = process_daily_reading(&block, today, MissingTodayPolicy::Suppress);

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"errcode": 93000, "errmsg": "invalid webhook url"})),
        )
        .mount(&server)
        .await;

    let client = WebhookClient::new(server.uri()).unwrap();
    assert!(matches!(
        client.deliver(MessageKind::Markdown, &message).await,
        Err(DeliveryError::Rejected { errcode: Some(93000), .. })
    ));
    assert!(!client.send(MessageKind::Markdown, &message).await);
}

async fn mock_webhook(reply: serde_json::Value, expected_posts: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply))
        .expect(expected_posts)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn daily_run_exit_status_follows_delivery() {
    let (block, today) = block_sent_at(14);

    let server = mock_webhook(json!({"errcode": 0, "errmsg": "ok"}), 1).await;
    let client = WebhookClient::new(server.uri()).unwrap();
    let run = run_daily_reading(&block, today, MissingTodayPolicy::Suppress, Some(&client), false).await;
    assert!(matches!(run, DailyRun::Sent(_)));
    assert!(run.is_success());

    let server = mock_webhook(json!({"errcode": 93000, "errmsg": "invalid webhook url"}), 1).await;
    let client = WebhookClient::new(server.uri()).unwrap();
    let run = run_daily_reading(&block, today, MissingTodayPolicy::Suppress, Some(&client), false).await;
    assert!(matches!(run, DailyRun::DeliveryFailed(_)));
    assert!(!run.is_success());
}

#[tokio::test]
async fn weekend_and_dry_run_never_post() {
    let server = mock_webhook(json!({"errcode": 0}), 0).await;
    let client = WebhookClient::new(server.uri()).unwrap();
    let sink: &dyn MessageSink = &client;

    let (block, today) = block_sent_at(15);
    let run = run_daily_reading(&block, today, MissingTodayPolicy::Suppress, Some(sink), false).await;
    assert_eq!(run, DailyRun::Weekend);
    assert!(run.is_success());

    let (block, today) = block_sent_at(14);
    let run = run_daily_reading(&block, today, MissingTodayPolicy::Suppress, Some(sink), true).await;
    assert!(matches!(run, DailyRun::Previewed(_)));
    assert!(run.is_success());
}

#[tokio::test]
async fn missing_webhook_fails_the_run() {
    let (block, today) = block_sent_at(14);
    let run = run_daily_reading(&block, today, MissingTodayPolicy::Suppress, None, false).await;
    assert!(matches!(run, DailyRun::NoWebhook(_)));
    assert!(!run.is_success());
}

#[test]
fn env_override_beats_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "wechat_work:\n  webhook_url: https://file.example/send\n").unwrap();

    let config = NotifyConfig::from_file(&path).unwrap();
    assert_eq!(
        config.webhook_url_with_override(Some("https://env.example/send".into())),
        Some("https://env.example/send".into())
    );
    assert_eq!(
        config.webhook_url_with_override(None),
        Some("https://file.example/send".into())
    );
}
