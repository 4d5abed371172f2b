//! All-time statistics: totals, averages, and the month-by-month breakdown.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::clock::monday_of;
use crate::segment::TimeSegment;

/// One calendar month of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthSummary {
    /// `YYYY-MM`.
    pub key: String,
    /// e.g. `January 2024`.
    pub label: String,
    pub total_minutes: i64,
    pub days: usize,
    pub avg_per_day: i64,
}

/// Statistics over every closed segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_minutes: i64,
    /// Days with positive recorded time.
    pub total_days: usize,
    pub avg_per_day: i64,
    pub avg_per_week: i64,
    pub avg_per_month: i64,
    /// Oldest month first.
    pub months: Vec<MonthSummary>,
    /// Largest month total, at least 1. Used to scale month bars.
    pub max_month_minutes: i64,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
}

/// `total / count` rounded half up. `count` must be positive.
fn average(total: i64, count: usize) -> i64 {
    let count = i64::try_from(count).unwrap_or(i64::MAX).max(1);
    (2 * total + count) / (2 * count)
}

/// Computes statistics from closed segments.
///
/// Segments whose end is not after their start are treated as invalid and
/// skipped, as are open segments. Returns `None` when no day has positive
/// recorded time.
pub fn summarize(segments: &[TimeSegment]) -> Option<Summary> {
    let mut by_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for segment in segments {
        let Some(minutes) = segment.duration_minutes().filter(|m| *m > 0) else {
            continue;
        };
        *by_day.entry(segment.date).or_default() += minutes;
    }

    let first_date = *by_day.keys().next()?;
    let last_date = *by_day.keys().next_back()?;
    let total_minutes: i64 = by_day.values().sum();
    let total_days = by_day.len();

    let weeks: BTreeSet<NaiveDate> = by_day.keys().map(|d| monday_of(*d)).collect();

    let mut by_month: BTreeMap<(i32, u32), (i64, usize)> = BTreeMap::new();
    for (date, minutes) in &by_day {
        let entry = by_month.entry((date.year(), date.month())).or_default();
        entry.0 += minutes;
        entry.1 += 1;
    }

    let months: Vec<MonthSummary> = by_month
        .iter()
        .map(|(&(year, month), &(total, days))| {
            let key = format!("{year:04}-{month:02}");
            let label = NaiveDate::from_ymd_opt(year, month, 1)
                .map_or_else(|| key.clone(), |d| d.format("%B %Y").to_string());
            MonthSummary {
                key,
                label,
                total_minutes: total,
                days,
                avg_per_day: average(total, days),
            }
        })
        .collect();

    let max_month_minutes = months
        .iter()
        .map(|m| m.total_minutes)
        .max()
        .unwrap_or_default()
        .max(1);

    Some(Summary {
        total_minutes,
        total_days,
        avg_per_day: average(total_minutes, total_days),
        avg_per_week: average(total_minutes, weeks.len()),
        avg_per_month: average(total_minutes, months.len()),
        months,
        max_month_minutes,
        first_date,
        last_date,
    })
}
