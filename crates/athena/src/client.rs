//! AWS Athena query execution client.
//!
//! Provides [`AthenaClient`] for the full report-query lifecycle against
//! AWS Athena: submit, poll to a terminal state with exponential backoff
//! and a deadline, fetch, and parse into [`QueryResult`].

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use aws_config::BehaviorVersion;
use aws_sdk_athena::types::QueryExecutionState;
use tracing::{debug, error, info, warn};

use crate::config::AthenaConfig;
use crate::result::{QueryColumn, QueryMetadata, QueryResult};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors that can occur during Athena operations.
#[derive(Debug, thiserror::Error)]
pub enum AthenaError {
    /// The query execution failed on the Athena side.
    #[error("Query {query_id} failed: {reason}")]
    QueryFailed { query_id: String, reason: String },

    /// The query was cancelled (either by the user or by Athena).
    #[error("Query {query_id} was cancelled")]
    QueryCancelled { query_id: String },

    /// The query was still pending when the poll deadline expired.
    #[error("Query {query_id} timed out after {seconds}s")]
    QueryTimeout { query_id: String, seconds: u32 },

    /// The query scanned more bytes than the configured limit.
    #[error("Scan limit exceeded: {bytes_scanned} bytes scanned, limit is {limit} bytes")]
    ScanLimitExceeded { bytes_scanned: u64, limit: u64 },

    /// An AWS SDK error (stringified).
    #[error("AWS SDK error: {0}")]
    AwsSdk(String),

    /// Failed to parse Athena result data.
    #[error("Parse error: {0}")]
    ParseError(String),
}

// ---------------------------------------------------------------------------
// Poll verdict
// ---------------------------------------------------------------------------

/// Outcome of inspecting one GetQueryExecution status snapshot.
#[derive(Debug, Clone, PartialEq)]
enum PollVerdict {
    /// QUEUED or RUNNING — keep polling.
    Pending,
    Succeeded,
    /// FAILED, carrying Athena's state-change reason.
    Failed(String),
    Cancelled,
}

/// Classify an execution state into a poll verdict.
///
/// Unknown future states are treated as pending, matching the SDK's
/// non-exhaustive enum.
fn classify_state(state: &QueryExecutionState, reason: Option<&str>) -> PollVerdict {
    match state {
        QueryExecutionState::Succeeded => PollVerdict::Succeeded,
        QueryExecutionState::Failed => {
            PollVerdict::Failed(reason.unwrap_or("unknown").to_string())
        }
        QueryExecutionState::Cancelled => PollVerdict::Cancelled,
        _ => PollVerdict::Pending,
    }
}

/// Advance the backoff delay: multiply by `factor`, capped at `max_ms`.
fn next_delay(delay_ms: u64, factor: f64, max_ms: u64) -> u64 {
    ((delay_ms as f64 * factor) as u64).min(max_ms)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for executing report queries against AWS Athena.
///
/// Wraps the AWS SDK Athena client and adds:
/// - Exponential-backoff polling with jitter, capped at the configured
///   poll interval
/// - Deadline enforcement with automatic cancellation
/// - Scan-limit checking (post-execution)
/// - Structured result parsing into [`QueryResult`]
pub struct AthenaClient {
    config: AthenaConfig,
    athena_client: aws_sdk_athena::Client,
}

impl AthenaClient {
    /// Create a new [`AthenaClient`] from the given configuration.
    ///
    /// The AWS SDK config is loaded using the region specified in `config`.
    pub async fn new(config: AthenaConfig) -> Result<Self, AthenaError> {
        let region = aws_sdk_athena::config::Region::new(config.region.clone());
        let aws_cfg = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .load()
            .await;

        let athena_client = aws_sdk_athena::Client::new(&aws_cfg);

        info!(
            region = %config.region,
            database = %config.database,
            workgroup = %config.workgroup,
            output_location = %config.output_location,
            "AthenaClient initialised"
        );

        Ok(Self {
            config,
            athena_client,
        })
    }

    // -----------------------------------------------------------------------
    // Public API
    // -----------------------------------------------------------------------

    /// Execute a SQL query against Athena and return the parsed results.
    ///
    /// This performs the full lifecycle:
    /// 1. Submit the query execution
    /// 2. Poll until a terminal state (with exponential backoff and deadline)
    /// 3. Fetch and parse results on success
    pub async fn execute_query(&self, sql: &str) -> Result<QueryResult, AthenaError> {
        info!(sql = %sql, "Starting Athena query");

        let query_id = self.submit(sql).await?;
        let query_execution = self.await_completion(&query_id).await?;
        let metadata = Self::extract_metadata(&query_id, &query_execution);

        self.fetch_results(&query_id, metadata).await
    }

    /// Execute a SQL query and check that bytes scanned does not exceed `max_scan_bytes`.
    ///
    /// Because Athena does not support pre-execution scan estimation, this check
    /// happens **after** the query completes.
    pub async fn execute_query_with_limit(
        &self,
        sql: &str,
        max_scan_bytes: u64,
    ) -> Result<QueryResult, AthenaError> {
        let result = self.execute_query(sql).await?;

        if result.metadata.bytes_scanned > max_scan_bytes {
            warn!(
                bytes_scanned = result.metadata.bytes_scanned,
                limit = max_scan_bytes,
                query_id = %result.metadata.query_id,
                "Query exceeded scan limit"
            );
            return Err(AthenaError::ScanLimitExceeded {
                bytes_scanned: result.metadata.bytes_scanned,
                limit: max_scan_bytes,
            });
        }

        Ok(result)
    }

    /// Submit a query and return Athena's execution ID.
    ///
    /// The result configuration points Athena at the configured S3 output
    /// location; the query runs in the configured database and workgroup.
    pub async fn submit(&self, sql: &str) -> Result<String, AthenaError> {
        let start_resp = self
            .athena_client
            .start_query_execution()
            .query_string(sql)
            .query_execution_context({
                let mut ctx = aws_sdk_athena::types::QueryExecutionContext::builder();
                if !self.config.database.is_empty() {
                    ctx = ctx.database(&self.config.database);
                }
                ctx.build()
            })
            .result_configuration(
                aws_sdk_athena::types::ResultConfiguration::builder()
                    .output_location(&self.config.output_location)
                    .build(),
            )
            .work_group(&self.config.workgroup)
            .send()
            .await
            .map_err(|e| AthenaError::AwsSdk(e.to_string()))?;

        let query_id = start_resp
            .query_execution_id()
            .ok_or_else(|| AthenaError::AwsSdk("No query execution ID returned".into()))?
            .to_string();

        info!(query_id = %query_id, "Query execution started");
        Ok(query_id)
    }

    /// Poll GetQueryExecution until the query leaves the QUEUED/RUNNING
    /// states or the configured deadline is exceeded.
    ///
    /// Backoff starts at 200ms, grows by 1.5x per attempt, and is capped at
    /// the configured poll interval. On deadline the query is cancelled
    /// best-effort and [`AthenaError::QueryTimeout`] is returned. A FAILED
    /// terminal state propagates Athena's state-change reason.
    pub async fn await_completion(
        &self,
        query_id: &str,
    ) -> Result<aws_sdk_athena::types::QueryExecution, AthenaError> {
        let start = Instant::now();
        let deadline = Duration::from_secs(self.config.timeout_seconds as u64);

        let initial_delay_ms: u64 = 200;
        let backoff_factor: f64 = 1.5;
        let max_delay_ms = self.config.poll_interval_ms;

        let mut delay_ms = initial_delay_ms;

        loop {
            let resp = self
                .athena_client
                .get_query_execution()
                .query_execution_id(query_id)
                .send()
                .await
                .map_err(|e| AthenaError::AwsSdk(e.to_string()))?;

            let qe = resp
                .query_execution()
                .ok_or_else(|| {
                    AthenaError::AwsSdk("No query execution in response".into())
                })?
                .clone();

            let state = qe
                .status()
                .and_then(|s| s.state())
                .cloned()
                .unwrap_or(QueryExecutionState::Queued);
            let reason = qe.status().and_then(|s| s.state_change_reason());

            debug!(
                query_id = %query_id,
                state = ?state,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Polling query status"
            );

            match classify_state(&state, reason) {
                PollVerdict::Succeeded => return Ok(qe),

                PollVerdict::Failed(reason) => {
                    error!(query_id = %query_id, reason = %reason, "Query failed");
                    return Err(AthenaError::QueryFailed {
                        query_id: query_id.to_string(),
                        reason,
                    });
                }

                PollVerdict::Cancelled => {
                    warn!(query_id = %query_id, "Query was cancelled");
                    return Err(AthenaError::QueryCancelled {
                        query_id: query_id.to_string(),
                    });
                }

                PollVerdict::Pending => {}
            }

            if start.elapsed() > deadline {
                warn!(
                    query_id = %query_id,
                    timeout_seconds = self.config.timeout_seconds,
                    "Query deadline exceeded, cancelling"
                );
                // Best-effort cancel — ignore errors from the cancel itself
                let _ = self.cancel_query(query_id).await;
                return Err(AthenaError::QueryTimeout {
                    query_id: query_id.to_string(),
                    seconds: self.config.timeout_seconds,
                });
            }

            // Compute jitter without rand: use nanosecond fraction of current time
            let jitter_ms = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .subsec_nanos()
                % 100;

            tokio::time::sleep(Duration::from_millis(delay_ms + jitter_ms as u64)).await;

            delay_ms = next_delay(delay_ms, backoff_factor, max_delay_ms);
        }
    }

    /// Fetch the full (unpaginated) result set for a completed query and
    /// parse it into a [`QueryResult`].
    pub async fn fetch_results(
        &self,
        query_id: &str,
        metadata: QueryMetadata,
    ) -> Result<QueryResult, AthenaError> {
        let results_output = self
            .athena_client
            .get_query_results()
            .query_execution_id(query_id)
            .send()
            .await
            .map_err(|e| AthenaError::AwsSdk(e.to_string()))?;

        Self::parse_results(&results_output, metadata)
    }

    /// Cancel a running Athena query.
    pub async fn cancel_query(&self, query_id: &str) -> Result<(), AthenaError> {
        info!(query_id = %query_id, "Cancelling query");

        self.athena_client
            .stop_query_execution()
            .query_execution_id(query_id)
            .send()
            .await
            .map_err(|e| AthenaError::AwsSdk(e.to_string()))?;

        info!(query_id = %query_id, "Query cancellation requested");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    /// Parse the raw SDK [`GetQueryResultsOutput`] into our [`QueryResult`].
    ///
    /// Athena returns column metadata in `ResultSetMetadata` and data rows in
    /// `ResultSet.Rows`. For SELECT queries the first row echoes the column
    /// headers; it is kept in place — the report format renders it as the
    /// header line.
    ///
    /// [`GetQueryResultsOutput`]: aws_sdk_athena::operation::get_query_results::GetQueryResultsOutput
    fn parse_results(
        output: &aws_sdk_athena::operation::get_query_results::GetQueryResultsOutput,
        metadata: QueryMetadata,
    ) -> Result<QueryResult, AthenaError> {
        let result_set = output
            .result_set()
            .ok_or_else(|| AthenaError::ParseError("No ResultSet in response".into()))?;

        let columns: Vec<QueryColumn> = result_set
            .result_set_metadata()
            .map(|meta| {
                meta.column_info()
                    .iter()
                    .map(|ci| QueryColumn {
                        name: ci.name().to_string(),
                        data_type: ci.r#type().to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let rows: Vec<Vec<Option<String>>> = result_set
            .rows()
            .iter()
            .map(|row| {
                row.data()
                    .iter()
                    .map(|datum| datum.var_char_value().map(|v| v.to_string()))
                    .collect()
            })
            .collect();

        debug!(
            columns = columns.len(),
            rows = rows.len(),
            query_id = %metadata.query_id,
            "Parsed Athena results"
        );

        Ok(QueryResult {
            columns,
            rows,
            metadata,
        })
    }

    /// Extract [`QueryMetadata`] from an SDK [`QueryExecution`].
    ///
    /// [`QueryExecution`]: aws_sdk_athena::types::QueryExecution
    fn extract_metadata(
        query_id: &str,
        qe: &aws_sdk_athena::types::QueryExecution,
    ) -> QueryMetadata {
        let stats = qe.statistics();
        let status = qe.status();

        QueryMetadata {
            query_id: query_id.to_string(),
            bytes_scanned: stats
                .and_then(|s| s.data_scanned_in_bytes())
                .unwrap_or(0) as u64,
            execution_time_ms: stats
                .and_then(|s| s.engine_execution_time_in_millis())
                .unwrap_or(0) as u64,
            state: status
                .and_then(|s| s.state())
                .map(|s| format!("{:?}", s))
                .unwrap_or_else(|| "UNKNOWN".to_string()),
            output_location: qe
                .result_configuration()
                .and_then(|rc| rc.output_location())
                .map(|s| s.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests — poll/parse logic only, no AWS calls
// ---------------------------------------------------------------------------
