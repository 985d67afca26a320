use std::fmt;

use serde::{Deserialize, Serialize};

/// Column definition returned by an Athena query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryColumn {
    /// Column name as declared in the result set.
    pub name: String,
    /// Athena data type (e.g. "varchar", "bigint", "double").
    pub data_type: String,
}

/// Execution metadata for a completed Athena query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryMetadata {
    /// Athena query execution ID.
    pub query_id: String,
    /// Total bytes scanned during execution.
    pub bytes_scanned: u64,
    /// Engine execution time in milliseconds.
    pub execution_time_ms: u64,
    /// Final execution state ("SUCCEEDED", "FAILED", "CANCELLED").
    pub state: String,
    /// S3 output location where results were written, if available.
    pub output_location: Option<String>,
}

/// Structured result set from an Athena query execution.
///
/// Rows are stored as `Vec<Option<String>>` where `None` represents SQL NULL.
/// For SELECT queries Athena echoes the column headers as the first row;
/// that row is retained, since the report format uses it as the header line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column definitions in result-set order.
    pub columns: Vec<QueryColumn>,
    /// Row data, verbatim from the warehouse (header echo included).
    pub rows: Vec<Vec<Option<String>>>,
    /// Query execution metadata.
    pub metadata: QueryMetadata,
}

/// Athena pricing: $5 per TB scanned.
const DOLLARS_PER_BYTE: f64 = 5.0 / (1024.0 * 1024.0 * 1024.0 * 1024.0);

impl QueryResult {
    /// Returns the number of rows in the result set, header echo included.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the number of columns in the result set.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the result set contains no rows at all.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Estimates the query cost in USD based on Athena's $5/TB pricing model.
    pub fn cost_estimate_usd(&self) -> f64 {
        self.metadata.bytes_scanned as f64 * DOLLARS_PER_BYTE
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rows.is_empty() {
            return write!(f, "(empty result set)");
        }

        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    write!(f, " | ")?;
                }
                write!(f, "{}", cell.as_deref().unwrap_or("NULL"))?;
            }
            writeln!(f)?;
        }

        write!(
            f,
            "Query {} | {} rows | {:.3} MB scanned | {}ms | ${:.6}",
            self.metadata.query_id,
            self.rows.len(),
            self.metadata.bytes_scanned as f64 / (1024.0 * 1024.0),
            self.metadata.execution_time_ms,
            self.cost_estimate_usd(),
        )
    }
}
