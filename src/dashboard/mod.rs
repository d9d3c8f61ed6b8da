pub mod handlers;

use serde::Serialize;
use time::{Duration, OffsetDateTime};

use crate::{readings::repo_types::GlucoseReading, timefmt};

pub const RECENT_ITEMS: i64 = 5;
pub const WEEK_DAYS: i64 = 7;

/// Glucose levels of the last week, ready for a line chart.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeekSummary {
    /// Rounded to one decimal, 0 when there are no readings.
    pub average: f64,
    pub count: usize,
    pub chart_dates: Vec<String>,
    pub chart_values: Vec<i32>,
}

/// Midnight UTC seven calendar days before `now`.
pub fn week_start(now: OffsetDateTime) -> OffsetDateTime {
    (now.date() - Duration::days(WEEK_DAYS)).midnight().assume_utc()
}

/// `readings` must be oldest first.
pub fn summarize_week(readings: &[GlucoseReading]) -> WeekSummary {
    let average = if readings.is_empty() {
        0.0
    } else {
        let sum: f64 = readings.iter().map(|r| f64::from(r.glucose_level)).sum();
        (sum / readings.len() as f64 * 10.0).round() / 10.0
    };
    WeekSummary {
        average,
        count: readings.len(),
        chart_dates: readings.iter().map(|r| timefmt::minute(r.timestamp)).collect(),
        chart_values: readings.iter().map(|r| r.glucose_level).collect(),
    }
}
