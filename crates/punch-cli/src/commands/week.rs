//! Week command: per-day totals for one Monday-to-Sunday week.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use punch_core::aggregate::WeekView;
use punch_core::clock::{Clock, format_decimal_hours, format_minutes};
use punch_core::store::SegmentStore;
use punch_core::tracker::Tracker;

use super::util::progress_bar;

pub fn run<W: Write, S: SegmentStore, C: Clock>(
    writer: &mut W,
    tracker: &Tracker<S, C>,
    date: NaiveDate,
    json: bool,
) -> Result<()> {
    let view = tracker
        .week_view(date)
        .with_context(|| format!("failed to load the week of {date}"))?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&view)?)?;
    } else {
        write!(writer, "{}", format_week(&view))?;
    }
    Ok(())
}

pub fn format_week(view: &WeekView) -> String {
    let mut output = String::new();
    writeln!(output, "Week of {}", view.label).unwrap();
    writeln!(output).unwrap();

    let max_minutes = view.days.iter().map(|d| d.minutes).max().unwrap_or(0);
    for day in &view.days {
        let bar = progress_bar(day.minutes, max_minutes);
        let total = if day.worked || day.minutes > 0 {
            format_minutes(day.minutes)
        } else {
            "-".to_string()
        };
        let today = if day.is_today { "  (today)" } else { "" };
        writeln!(output, "  {:<9}  {bar}  {total}{today}", day.weekday).unwrap();
    }

    writeln!(output).unwrap();
    let plural = if view.days_worked == 1 { "" } else { "s" };
    writeln!(
        output,
        "Total: {} ({}), {} day{plural} worked",
        format_minutes(view.total_minutes),
        format_decimal_hours(view.total_minutes),
        view.days_worked
    )
    .unwrap();
    output
}
