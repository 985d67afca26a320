use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

/// Timestamp literal format used in the ALB log queries.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// UTC start/end pair bounding the analytic queries for one run.
///
/// The window always starts at the day boundary. A full-day window ends at
/// 23:59:59.999; an end hour produces a same-day cutoff instead (the
/// production report runs against a partial day).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportWindow {
    /// Window for a specific UTC day.
    pub fn for_date(date: NaiveDate, end_hour: Option<u32>) -> Self {
        let start = date.and_time(NaiveTime::MIN).and_utc();
        let end = match end_hour {
            Some(hour) => start + Duration::hours(i64::from(hour)),
            None => start + Duration::days(1) - Duration::milliseconds(1),
        };
        Self { start, end }
    }

    /// Window for the current UTC day.
    pub fn today(end_hour: Option<u32>) -> Self {
        Self::for_date(Utc::now().date_naive(), end_hour)
    }

    /// Start bound rendered as a query literal.
    pub fn start_literal(&self) -> String {
        self.start.format(TIMESTAMP_FORMAT).to_string()
    }

    /// End bound rendered as a query literal.
    pub fn end_literal(&self) -> String {
        self.end.format(TIMESTAMP_FORMAT).to_string()
    }

    /// The window's date, as shown in the report header.
    pub fn date_label(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn full_day_window() {
        let window = ReportWindow::for_date(date(2024, 1, 1), None);
        assert_eq!(window.start_literal(), "2024-01-01T00:00:00.000Z");
        assert_eq!(window.end_literal(), "2024-01-01T23:59:59.999Z");
    }

    #[test]
    fn window_with_end_hour() {
        let window = ReportWindow::for_date(date(2024, 1, 1), Some(17));
        assert_eq!(window.start_literal(), "2024-01-01T00:00:00.000Z");
        assert_eq!(window.end_literal(), "2024-01-01T17:00:00.000Z");
    }

    #[test]
    fn date_label_matches_window_day() {
        let window = ReportWindow::for_date(date(2024, 12, 31), None);
        assert_eq!(window.date_label(), "2024-12-31");
    }

    #[test]
    fn month_boundary() {
        let window = ReportWindow::for_date(date(2024, 2, 29), None);
        assert_eq!(window.start_literal(), "2024-02-29T00:00:00.000Z");
        assert_eq!(window.end_literal(), "2024-02-29T23:59:59.999Z");
    }

    #[test]
    fn today_is_day_truncated() {
        let window = ReportWindow::today(None);
        assert!(window.start_literal().ends_with("T00:00:00.000Z"));
        assert!(window.end_literal().ends_with("T23:59:59.999Z"));
        assert_eq!(window.start.date_naive(), window.end.date_naive());
    }
}
