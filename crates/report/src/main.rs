//! stt-report — scheduled STT traffic report.
//!
//! Runs the two ALB-log analytics queries for the report window, formats
//! the results, and delivers the combined report to Telegram. One
//! invocation produces one report; scheduling stays with the invoker
//! (cron, EventBridge, ...). Exit status signals success or failure back
//! to the scheduler.

use chrono::NaiveDate;
use clap::Parser;
use tracing::info;

use stt_report::config::{self, ReportConfig};
use stt_report::workflow::run_report;

// ── CLI ─────────────────────────────────────────────────────────────

/// Daily STT traffic report: Athena ALB-log analytics delivered to Telegram.
#[derive(Parser, Debug)]
#[command(name = "stt-report", version, about)]
struct Cli {
    /// Config profile (e.g. PROD); prefixes every env lookup.
    #[arg(long, env = "REPORT_PROFILE", default_value = "")]
    profile: String,

    /// Report this UTC day (YYYY-MM-DD) instead of today.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Print the composed report to stdout instead of delivering it.
    #[arg(long)]
    dry_run: bool,
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    config::load_dotenv();

    let cli = Cli::parse();

    let config = ReportConfig::for_profile(&cli.profile);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;
    config.log_summary();

    info!("stt-report starting");
    run_report(&config, cli.date, cli.dry_run).await?;
    info!("stt-report finished");

    Ok(())
}
