//! The run-once report workflow: window → queries → format → deliver.
//!
//! Control flows strictly forward. Every external-call failure is
//! propagated unchanged and aborts the remaining steps; nothing is
//! retried within a run.

use chrono::NaiveDate;
use tracing::{debug, info};

use stt_report_athena::{AthenaClient, AthenaError};
use stt_report_notify::{Notification, Notifier, NotifyError, TelegramNotifier};

use crate::config::ReportConfig;
use crate::format::{compose_report, format_rows};
use crate::queries::{response_time_query, status_code_query};
use crate::window::ReportWindow;

/// Errors that abort a report run.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Athena error: {0}")]
    Athena(#[from] AthenaError),

    #[error("Notify error: {0}")]
    Notify(#[from] NotifyError),
}

/// Run one query through its full lifecycle and format the result as a
/// report section.
async fn run_query(
    client: &AthenaClient,
    config: &ReportConfig,
    sql: &str,
) -> Result<String, ReportError> {
    let result = if config.athena.max_scan_bytes > 0 {
        client
            .execute_query_with_limit(sql, config.athena.max_scan_bytes)
            .await?
    } else {
        client.execute_query(sql).await?
    };

    info!(
        query_id = %result.metadata.query_id,
        rows = result.row_count(),
        bytes_scanned = result.metadata.bytes_scanned,
        cost_usd = result.cost_estimate_usd(),
        "Query complete"
    );
    debug!(result = %result, "Query result");

    Ok(format_rows(&result.rows))
}

/// Execute the full report workflow: compute the window, run both queries
/// sequentially, compose the report, deliver it to Telegram.
///
/// With `dry_run` the composed report is printed to stdout instead of
/// being sent.
pub async fn run_report(
    config: &ReportConfig,
    date: Option<NaiveDate>,
    dry_run: bool,
) -> Result<(), ReportError> {
    let window = match date {
        Some(d) => ReportWindow::for_date(d, config.window_end_hour),
        None => ReportWindow::today(config.window_end_hour),
    };

    info!(
        start = %window.start_literal(),
        end = %window.end_literal(),
        "Report window computed"
    );

    let client = AthenaClient::new(config.athena.clone()).await?;

    let response_times =
        run_query(&client, config, &response_time_query(&window, &config.target)).await?;
    let status_codes =
        run_query(&client, config, &status_code_query(&window, &config.target)).await?;

    let text = compose_report(
        &window.date_label(),
        &config.title,
        &[response_times, status_codes],
    );

    if dry_run {
        info!("Dry run, skipping delivery");
        println!("{text}");
        return Ok(());
    }

    let notifier = TelegramNotifier::new(
        config.telegram.bot_token.clone(),
        config.telegram.chat_id.clone(),
    )?;

    notifier
        .send(&Notification {
            subject: format!("{} {}", config.title, window.date_label()),
            body: text,
        })
        .await?;

    info!(channel = notifier.channel_name(), "Report delivered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_errors_wrap_both_sources() {
        let err: ReportError = AthenaError::QueryFailed {
            query_id: "q-1".into(),
            reason: "TABLE_NOT_FOUND".into(),
        }
        .into();
        assert!(err.to_string().contains("TABLE_NOT_FOUND"));

        let err: ReportError = NotifyError::Config("chat id missing".into()).into();
        assert!(err.to_string().contains("chat id missing"));
    }
}
