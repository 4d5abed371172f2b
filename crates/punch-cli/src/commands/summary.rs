//! Summary command: all-time totals, averages and the monthly breakdown.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use punch_core::clock::{Clock, format_minutes};
use punch_core::store::SegmentStore;
use punch_core::summary::Summary;
use punch_core::tracker::Tracker;

use super::util::progress_bar;

pub fn run<W: Write, S: SegmentStore, C: Clock>(
    writer: &mut W,
    tracker: &Tracker<S, C>,
    json: bool,
) -> Result<()> {
    let summary = tracker.summary().context("failed to load recorded segments")?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&summary)?)?;
    } else {
        write!(writer, "{}", format_summary(summary.as_ref()))?;
    }
    Ok(())
}

fn days(n: usize) -> String {
    if n == 1 {
        "1 day".to_string()
    } else {
        format!("{n} days")
    }
}

pub fn format_summary(summary: Option<&Summary>) -> String {
    let mut output = String::new();
    let Some(summary) = summary else {
        writeln!(output, "No completed work recorded yet.").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "Hint: Run 'punch start' to begin tracking.").unwrap();
        return output;
    };

    writeln!(
        output,
        "Summary: {} – {}",
        summary.first_date.format("%b %-d, %Y"),
        summary.last_date.format("%b %-d, %Y")
    )
    .unwrap();
    writeln!(output).unwrap();
    writeln!(
        output,
        "Total:     {} over {}",
        format_minutes(summary.total_minutes),
        days(summary.total_days)
    )
    .unwrap();
    writeln!(output, "Per day:   {}", format_minutes(summary.avg_per_day)).unwrap();
    writeln!(output, "Per week:  {}", format_minutes(summary.avg_per_week)).unwrap();
    writeln!(output, "Per month: {}", format_minutes(summary.avg_per_month)).unwrap();

    writeln!(output).unwrap();
    writeln!(output, "Months:").unwrap();
    for month in &summary.months {
        let bar = progress_bar(month.total_minutes, summary.max_month_minutes);
        let total = format_minutes(month.total_minutes);
        writeln!(
            output,
            "  {:<14}  {bar}  {total:>7}  {}, {}/day",
            month.label,
            days(month.days),
            format_minutes(month.avg_per_day)
        )
        .unwrap();
    }
    output
}
