//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use chrono::NaiveDate;
use punch_core::clock::{add_days, checked_monday_of};
use regex::Regex;

/// Pre-compiled regex for relative date parsing.
static RELATIVE_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(day|week)s?\s+ago$").unwrap());

/// Conservative bound for relative dates (~1000 years in days).
const MAX_RELATIVE_DAYS: i64 = 1000 * 366;

/// Parse a date given as ISO 8601, a keyword, or relative to `today`.
///
/// Supports:
/// - ISO 8601: "2024-01-15"
/// - Keywords: "today", "yesterday"
/// - Relative: "3 days ago", "1 week ago"
///
/// Dates whose Monday-to-Sunday week runs off the calendar are rejected.
pub fn parse_date(s: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    let date = resolve_date(s, today)?;
    if checked_monday_of(date).is_none() {
        anyhow::bail!("Date out of range: {date}");
    }
    Ok(date)
}

fn resolve_date(s: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    let s = s.trim().to_lowercase();
    match s.as_str() {
        "today" => return Ok(today),
        "yesterday" => return Ok(add_days(today, -1)),
        _ => {}
    }

    if let Ok(date) = s.parse::<NaiveDate>() {
        return Ok(date);
    }

    let Some(caps) = RELATIVE_DATE_RE.captures(&s) else {
        anyhow::bail!(
            "Invalid date: {s}. Use YYYY-MM-DD (e.g., 2024-01-15), 'today', 'yesterday' or relative (e.g., '3 days ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative date")?;
    let days_per_unit = if &caps[2] == "week" { 7 } else { 1 };
    if n > MAX_RELATIVE_DAYS / days_per_unit {
        anyhow::bail!("Relative date value too large: {n} {}", &caps[2]);
    }

    Ok(add_days(today, -n * days_per_unit))
}

/// Renders a 10-character bar of `value` relative to `max`.
///
/// Any positive value below 5% still shows one block.
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "ratio is clamped to 0..=1 before scaling to 10 blocks"
)]
pub fn progress_bar(value: i64, max: i64) -> String {
    if max <= 0 || value <= 0 {
        return "░".repeat(10);
    }

    let ratio = (value as f64 / max as f64).min(1.0);
    let filled = if ratio < 0.05 {
        1
    } else {
        (ratio * 10.0).round() as usize
    };

    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}
