use std::env;

use serde::{Deserialize, Serialize};

/// Default S3 output location for Athena query results.
const DEFAULT_OUTPUT_LOCATION: &str = "s3://stt-report-athena-results/";

/// 10 GB in bytes (10 * 1024^3).
const DEFAULT_MAX_SCAN_BYTES: u64 = 10_737_418_240;

/// Steady-state poll interval in milliseconds (the backoff ceiling).
const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

// ── Env helpers (mirrors report/config.rs, kept local to avoid circular dep) ──

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

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── AthenaConfig ─────────────────────────────────────────────────

/// Configuration for the Athena warehouse connection.
///
/// Reads from environment variables with optional profile prefix.
/// When `REPORT_PROFILE=PROD`, checks `PROD_ATHENA_DATABASE` before `ATHENA_DATABASE`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AthenaConfig {
    /// AWS region for Athena queries.
    pub region: String,
    /// Athena database name.
    pub database: String,
    /// Athena workgroup.
    pub workgroup: String,
    /// S3 path for query results.
    pub output_location: String,
    /// Maximum bytes to scan per query (0 = unlimited).
    pub max_scan_bytes: u64,
    /// Poll deadline in seconds. A query still QUEUED/RUNNING past this
    /// point is cancelled and reported as timed out.
    pub timeout_seconds: u32,
    /// Backoff ceiling for status polling, in milliseconds.
    pub poll_interval_ms: u64,
}

impl AthenaConfig {
    /// Build config from environment variables.
    ///
    /// Reads `REPORT_PROFILE` to determine profile prefix.
    /// For each key, tries `{PROFILE}_ATHENA_*` first, then `ATHENA_*`.
    /// `ATHENA_REGION` falls back to `AWS_REGION` before using the default.
    pub fn from_env() -> Self {
        let profile = env_opt("REPORT_PROFILE")
            .map(|s| s.to_uppercase())
            .unwrap_or_default();
        Self::from_env_profiled(&profile)
    }

    /// Build config for a specific named profile.
    pub fn from_env_profiled(profile: &str) -> Self {
        let region = profiled_env_opt(profile, "ATHENA_REGION")
            .or_else(|| profiled_env_opt(profile, "AWS_REGION"))
            .unwrap_or_else(|| "ap-southeast-1".to_string());

        Self {
            region,
            database: profiled_env_or(profile, "ATHENA_DATABASE", "default"),
            workgroup: profiled_env_or(profile, "ATHENA_WORKGROUP", "primary"),
            output_location: profiled_env_or(
                profile,
                "ATHENA_OUTPUT_LOCATION",
                DEFAULT_OUTPUT_LOCATION,
            ),
            max_scan_bytes: profiled_env_u64(
                profile,
                "ATHENA_MAX_SCAN_BYTES",
                DEFAULT_MAX_SCAN_BYTES,
            ),
            timeout_seconds: profiled_env_u32(profile, "ATHENA_TIMEOUT_SECONDS", 300),
            poll_interval_ms: profiled_env_u64(
                profile,
                "ATHENA_POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL_MS,
            ),
        }
    }

    /// Returns `true` when the output location has been explicitly
    /// configured (differs from the placeholder default).
    pub fn is_configured(&self) -> bool {
        self.output_location != DEFAULT_OUTPUT_LOCATION
    }

    /// Convenience: max scan budget expressed in gigabytes.
    pub fn max_scan_gb(&self) -> f64 {
        self.max_scan_bytes as f64 / (1024.0 * 1024.0 * 1024.0)
    }
}

// ── Tests ────────────────────────────────────────────────────────
