use std::env;

use serde::{Deserialize, Serialize};

use crate::queries::QueryTarget;
use stt_report_athena::AthenaConfig;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

// ── Env helpers ──────────────────────────────────────────────────

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries `{PROFILE}_{KEY}` first, falls back to `{KEY}`.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u32_opt(profile: &str, key: &str) -> Option<u32> {
    profiled_env_opt(profile, key).and_then(|v| v.parse().ok())
}

// ── TelegramConfig ───────────────────────────────────────────────

/// Delivery credentials for the Telegram channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token.
    pub bot_token: String,
    /// Destination chat id.
    pub chat_id: String,
}

impl TelegramConfig {
    pub fn from_env_profiled(profile: &str) -> Self {
        Self {
            bot_token: profiled_env_or(profile, "TELEGRAM_BOT_TOKEN", ""),
            chat_id: profiled_env_or(profile, "TELEGRAM_CHAT_ID", ""),
        }
    }
}

// ── ReportConfig ─────────────────────────────────────────────────

/// Top-level configuration for one report run.
///
/// Reads from environment variables with optional profile prefix.
/// When `REPORT_PROFILE=PROD`, every key is first looked up as
/// `PROD_{KEY}`, falling back to `{KEY}` — the test/prod forks of this
/// job differ only in these values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Active profile name (empty = default).
    pub profile: String,
    pub athena: AthenaConfig,
    pub telegram: TelegramConfig,
    pub target: QueryTarget,
    /// Report title, rendered in the message header.
    pub title: String,
    /// Window cutoff hour (UTC). None = full day (23:59:59.999).
    pub window_end_hour: Option<u32>,
}

impl ReportConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    ///
    /// Profile is read from the `REPORT_PROFILE` env var.
    pub fn from_env() -> Self {
        let profile = env_opt("REPORT_PROFILE").unwrap_or_default();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();

        let client_ips: Vec<String> = profiled_env_or(p, "REPORT_CLIENT_IPS", "")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            profile: p.to_string(),
            athena: AthenaConfig::from_env_profiled(p),
            telegram: TelegramConfig::from_env_profiled(p),
            target: QueryTarget {
                table: profiled_env_or(p, "REPORT_TABLE", "alb_logs_db.alb_logs"),
                request_url: profiled_env_or(p, "REPORT_REQUEST_URL", ""),
                client_ips,
            },
            title: profiled_env_or(p, "REPORT_TITLE", "Report STT"),
            window_end_hour: profiled_env_u32_opt(p, "REPORT_WINDOW_END_HOUR"),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Reject configurations that cannot produce a deliverable report.
    pub fn validate(&self) -> Result<(), String> {
        if self.telegram.bot_token.is_empty() {
            return Err("TELEGRAM_BOT_TOKEN is not set".into());
        }
        if self.telegram.chat_id.is_empty() {
            return Err("TELEGRAM_CHAT_ID is not set".into());
        }
        if self.target.request_url.is_empty() {
            return Err("REPORT_REQUEST_URL is not set".into());
        }
        if self.target.client_ips.is_empty() {
            return Err("REPORT_CLIENT_IPS is not set".into());
        }
        if let Some(hour) = self.window_end_hour {
            if !(1..=23).contains(&hour) {
                return Err(format!(
                    "REPORT_WINDOW_END_HOUR must be between 1 and 23, got {hour}"
                ));
            }
        }
        Ok(())
    }

    /// Print a redacted summary for startup logs (no token).
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  athena:    region={}, database={}, workgroup={}, output={}",
            self.athena.region,
            self.athena.database,
            self.athena.workgroup,
            self.athena.output_location,
        );
        tracing::info!(
            "  poll:      deadline={}s, interval={}ms, scan_budget={:.1}GB",
            self.athena.timeout_seconds,
            self.athena.poll_interval_ms,
            self.athena.max_scan_gb(),
        );
        tracing::info!(
            "  target:    table={}, url={}, ips={}",
            self.target.table,
            self.target.request_url,
            self.target.client_ips.len(),
        );
        tracing::info!("  telegram:  chat_id={}", self.telegram.chat_id);
        tracing::info!(
            "  window:    end_hour={}",
            self.window_end_hour
                .map(|h| h.to_string())
                .unwrap_or_else(|| "full-day".to_string()),
        );
    }
}
