//! Analytic query builders for the ALB access-log table.
//!
//! The bounds are substituted in without validation; malformed bounds
//! produce a query Athena rejects at submission time.

use serde::{Deserialize, Serialize};

use crate::window::ReportWindow;

/// What slice of the ALB logs the report queries cover.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryTarget {
    /// Database-qualified ALB logs table.
    pub table: String,
    /// Exact request URL of the monitored endpoint.
    pub request_url: String,
    /// Client IPs whose traffic counts toward the report.
    pub client_ips: Vec<String>,
}

/// Render the client IP condition as a parenthesised OR chain.
fn client_ip_filter(ips: &[String]) -> String {
    let parts: Vec<String> = ips.iter().map(|ip| format!("client_ip = '{ip}'")).collect();
    format!("({})", parts.join(" OR "))
}

/// Latency histogram over `target_processing_time` for successful requests
/// in the window, bucketed into 0-3 / 3-5 / >5 seconds.
pub fn response_time_query(window: &ReportWindow, target: &QueryTarget) -> String {
    format!(
        "WITH time_intervals AS (
  SELECT
    CASE
      WHEN target_processing_time >= 0 AND target_processing_time <= 3 THEN '0-3 seconds'
      WHEN target_processing_time > 3 AND target_processing_time <= 5 THEN '3-5 seconds'
      ELSE '>5 seconds'
    END AS time_interval
  FROM {table}
  WHERE request_url = '{url}'
    AND {ips}
    AND elb_status_code = 200
    AND (time >= '{start}' AND time <= '{end}')
)
SELECT time_interval, COUNT(*) AS count
FROM time_intervals
GROUP BY time_interval
ORDER BY time_interval",
        table = target.table,
        url = target.request_url,
        ips = client_ip_filter(&target.client_ips),
        start = window.start_literal(),
        end = window.end_literal(),
    )
}

/// Request count per `elb_status_code` in the window.
pub fn status_code_query(window: &ReportWindow, target: &QueryTarget) -> String {
    format!(
        "SELECT elb_status_code, COUNT(elb_status_code) AS total_request
FROM {table}
WHERE request_url = '{url}'
  AND {ips}
  AND (time >= '{start}' AND time <= '{end}')
GROUP BY elb_status_code
ORDER BY elb_status_code ASC",
        table = target.table,
        url = target.request_url,
        ips = client_ip_filter(&target.client_ips),
        start = window.start_literal(),
        end = window.end_literal(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_target() -> QueryTarget {
        QueryTarget {
            table: "s3_albvaenginelogs_db.s3_alb_va_engine_logs".into(),
            request_url: "https://api.example.com:443/transform-service/va/stt?noiseDetection=true"
                .into(),
            client_ips: vec!["124.158.11.112".into(), "119.82.135.12".into()],
        }
    }

    fn sample_window() -> ReportWindow {
        ReportWindow::for_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), None)
    }

    #[test]
    fn window_literals_appear_exactly_once() {
        let window = sample_window();
        for sql in [
            response_time_query(&window, &sample_target()),
            status_code_query(&window, &sample_target()),
        ] {
            assert_eq!(sql.matches("2024-01-01T00:00:00.000Z").count(), 1, "{sql}");
            assert_eq!(sql.matches("2024-01-01T23:59:59.999Z").count(), 1, "{sql}");
            // No timestamp literals beyond the window's own bounds.
            assert_eq!(sql.matches("2024-01-01T").count(), 2, "{sql}");
        }
    }

    #[test]
    fn response_time_query_shape() {
        let sql = response_time_query(&sample_window(), &sample_target());
        assert!(sql.contains("FROM s3_albvaenginelogs_db.s3_alb_va_engine_logs"));
        assert!(sql.contains("'0-3 seconds'"));
        assert!(sql.contains("'3-5 seconds'"));
        assert!(sql.contains("'>5 seconds'"));
        // Only successful requests count toward the latency histogram.
        assert!(sql.contains("elb_status_code = 200"));
        assert!(sql.contains("GROUP BY time_interval"));
    }

    #[test]
    fn status_code_query_shape() {
        let sql = status_code_query(&sample_window(), &sample_target());
        assert!(sql.contains("COUNT(elb_status_code) AS total_request"));
        assert!(sql.contains("GROUP BY elb_status_code"));
        assert!(sql.contains("ORDER BY elb_status_code ASC"));
        // No success-only filter here: the point is the status breakdown.
        assert!(!sql.contains("elb_status_code = 200"));
    }

    #[test]
    fn ip_filter_renders_or_chain() {
        let sql = status_code_query(&sample_window(), &sample_target());
        assert!(sql.contains("(client_ip = '124.158.11.112' OR client_ip = '119.82.135.12')"));
    }

    #[test]
    fn single_ip_has_no_or() {
        let target = QueryTarget {
            client_ips: vec!["10.0.0.1".into()],
            ..sample_target()
        };
        let sql = status_code_query(&sample_window(), &target);
        assert!(sql.contains("(client_ip = '10.0.0.1')"));
        assert!(!sql.contains(" OR "));
    }

    #[test]
    fn end_hour_window_flows_through() {
        let window = ReportWindow::for_date(
            NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            Some(17),
        );
        let sql = status_code_query(&window, &sample_target());
        assert!(sql.contains("time <= '2024-06-15T17:00:00.000Z'"));
    }
}
