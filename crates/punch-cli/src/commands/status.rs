//! Status command for showing today's session at a glance.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use punch_core::aggregate::DayView;
use punch_core::clock::{Clock, ClockFormat, date_header, format_elapsed, format_minutes};
use punch_core::session::SessionStatus;
use punch_core::store::SegmentStore;
use punch_core::tracker::Tracker;

pub fn run<W: Write, S: SegmentStore, C: Clock>(
    writer: &mut W,
    tracker: &Tracker<S, C>,
    format: ClockFormat,
) -> Result<()> {
    let view = tracker
        .day_view(tracker.today())
        .context("failed to load today's segments")?;
    write!(writer, "{}", format_status(&view, tracker.status(), format))?;
    Ok(())
}

/// Renders the status block for today's view.
pub fn format_status(view: &DayView, status: SessionStatus, format: ClockFormat) -> String {
    let mut output = String::new();
    writeln!(output, "{}", date_header(view.date)).unwrap();
    writeln!(output, "Status:  {} ({})", status.label(), status.hint()).unwrap();
    writeln!(output, "Elapsed: {}", format_elapsed(view.elapsed_seconds)).unwrap();

    if let Some(started) = view.started {
        writeln!(output, "Started: {}", started.display(format)).unwrap();
    }
    if status == SessionStatus::Stopped {
        if let Some(ended) = view.ended {
            writeln!(output, "Ended:   {}", ended.display(format)).unwrap();
        }
    }
    if !view.breaks.is_empty() {
        let break_minutes: i64 = view.breaks.iter().map(|b| b.duration_minutes.max(0)).sum();
        writeln!(
            output,
            "Breaks:  {} ({})",
            view.breaks.len(),
            format_minutes(break_minutes)
        )
        .unwrap();
    }
    output
}
