//! Integration tests for the stt-report crate.
//!
//! These tests exercise the window → query → format → compose pipeline
//! without requiring AWS credentials or a Telegram bot.

use std::env;
use std::sync::Mutex;

use chrono::NaiveDate;

use stt_report::config::ReportConfig;
use stt_report::format::{compose_report, format_rows};
use stt_report::queries::{response_time_query, status_code_query, QueryTarget};
use stt_report::window::ReportWindow;

// Env-based tests must run serially to avoid interfering with each other.
static ENV_LOCK: Mutex<()> = Mutex::new(());

// Helper: clear all report env vars used by the config.
fn clear_report_env() {
    let keys = [
        "REPORT_PROFILE",
        "REPORT_TABLE",
        "REPORT_REQUEST_URL",
        "REPORT_CLIENT_IPS",
        "REPORT_TITLE",
        "REPORT_WINDOW_END_HOUR",
        "TELEGRAM_BOT_TOKEN",
        "TELEGRAM_CHAT_ID",
        "ATHENA_REGION",
        "ATHENA_DATABASE",
        "ATHENA_OUTPUT_LOCATION",
        "AWS_REGION",
        "PROD_REPORT_TITLE",
        "PROD_ATHENA_DATABASE",
        "PROD_REPORT_WINDOW_END_HOUR",
    ];
    for k in keys {
        env::remove_var(k);
    }
}

fn target() -> QueryTarget {
    QueryTarget {
        table: "s3_albvaenginelogs_db.s3_alb_va_engine_logs".into(),
        request_url: "https://api.example.com:443/transform-service/va/stt?noiseDetection=true"
            .into(),
        client_ips: vec!["124.158.11.112".into(), "119.82.135.12".into()],
    }
}

// ── End-to-end formatting scenario ───────────────────────────────────

#[test]
fn test_report_pipeline_for_one_day() {
    // Window: 2024-01-01T00:00:00.000Z .. 2024-01-01T23:59:59.999Z
    let window = ReportWindow::for_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), None);
    assert_eq!(window.start_literal(), "2024-01-01T00:00:00.000Z");
    assert_eq!(window.end_literal(), "2024-01-01T23:59:59.999Z");

    // Both queries carry exactly this window.
    let sql = status_code_query(&window, &target());
    assert!(sql.contains("time >= '2024-01-01T00:00:00.000Z'"));
    assert!(sql.contains("time <= '2024-01-01T23:59:59.999Z'"));

    // Warehouse returns rows [["200","10"],["404","2"]].
    let rows: Vec<Vec<Option<String>>> = vec![
        vec![Some("200".into()), Some("10".into())],
        vec![Some("404".into()), Some("2".into())],
    ];
    let section = format_rows(&rows);
    assert_eq!(section, "* | 200 | 10 |\n  + 404: 2 requests\n");
}

#[test]
fn test_notification_text_composition() {
    let text = compose_report("2024-01-01", "Report STT", &["A".into(), "B".into()]);
    assert_eq!(text, "✍️ [2024-01-01] Report STT\n\nA\nB\n");
}

#[test]
fn test_empty_result_section_is_empty() {
    let section = format_rows(&[]);
    assert_eq!(section, "");

    // The report still carries the (empty) section slot.
    let text = compose_report("2024-01-01", "Report STT", &[section, "B".into()]);
    assert_eq!(text, "✍️ [2024-01-01] Report STT\n\n\nB\n");
}

// ── Query/window interplay ───────────────────────────────────────────

#[test]
fn test_both_queries_share_the_window() {
    let window = ReportWindow::for_date(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(), Some(17));

    for sql in [
        response_time_query(&window, &target()),
        status_code_query(&window, &target()),
    ] {
        assert_eq!(sql.matches("2024-06-15T00:00:00.000Z").count(), 1);
        assert_eq!(sql.matches("2024-06-15T17:00:00.000Z").count(), 1);
    }
}

// ── Config tests ─────────────────────────────────────────────────────

#[test]
fn test_config_from_env() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_report_env();

    env::set_var("TELEGRAM_BOT_TOKEN", "123456:ABC-DEF");
    env::set_var("TELEGRAM_CHAT_ID", "-100123");
    env::set_var("REPORT_TABLE", "s3_albvaenginelogs_db.s3_alb_va_engine_logs");
    env::set_var(
        "REPORT_REQUEST_URL",
        "https://api.example.com:443/transform-service/va/stt?noiseDetection=true",
    );
    env::set_var("REPORT_CLIENT_IPS", "124.158.11.112,119.82.135.12");
    env::set_var("ATHENA_DATABASE", "s3_albvaenginelogs_db");
    env::set_var("ATHENA_OUTPUT_LOCATION", "s3://aws-athena-reports/REPORTS");

    let cfg = ReportConfig::from_env();

    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.target.table, "s3_albvaenginelogs_db.s3_alb_va_engine_logs");
    assert_eq!(cfg.target.client_ips.len(), 2);
    assert_eq!(cfg.athena.database, "s3_albvaenginelogs_db");
    assert_eq!(cfg.title, "Report STT");

    clear_report_env();
}

#[test]
fn test_config_profile_fork() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_report_env();

    env::set_var("TELEGRAM_BOT_TOKEN", "123456:ABC-DEF");
    env::set_var("TELEGRAM_CHAT_ID", "-100123");
    env::set_var("REPORT_REQUEST_URL", "https://api.example.com/stt");
    env::set_var("REPORT_CLIENT_IPS", "10.0.0.1");

    // The production fork reports a partial day with its own database.
    env::set_var("REPORT_PROFILE", "PROD");
    env::set_var("PROD_ATHENA_DATABASE", "prod_alb_logs");
    env::set_var("PROD_REPORT_WINDOW_END_HOUR", "17");

    let cfg = ReportConfig::from_env();

    assert_eq!(cfg.profile_label(), "PROD");
    assert_eq!(cfg.athena.database, "prod_alb_logs");
    assert_eq!(cfg.window_end_hour, Some(17));
    assert!(cfg.validate().is_ok());

    let window = ReportWindow::for_date(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        cfg.window_end_hour,
    );
    assert_eq!(window.end_literal(), "2024-01-01T17:00:00.000Z");

    clear_report_env();
}
