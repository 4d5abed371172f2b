//! Start, pause, resume and stop.

use std::io::Write;

use anyhow::{Context, Result};
use punch_core::aggregate::day_total_minutes;
use punch_core::clock::{Clock, ClockFormat, ClockTime, format_minutes};
use punch_core::session::Action;
use punch_core::store::SegmentStore;
use punch_core::tracker::{Outcome, Tracker};

/// Applies `action` to today's session and reports what happened.
///
/// Actions that are not valid from the current status change nothing and
/// are reported, not treated as errors.
pub fn run<W: Write, S: SegmentStore, C: Clock>(
    writer: &mut W,
    tracker: &mut Tracker<S, C>,
    action: Action,
    format: ClockFormat,
) -> Result<()> {
    let outcome = tracker
        .apply(action)
        .with_context(|| format!("failed to {action}"))?;
    writeln!(writer, "{}", format_outcome(tracker, action, outcome, format))?;
    Ok(())
}

fn format_outcome<S: SegmentStore, C: Clock>(
    tracker: &Tracker<S, C>,
    action: Action,
    outcome: Outcome,
    format: ClockFormat,
) -> String {
    if !outcome.applied {
        return format!(
            "Cannot {action} while {}: {}.",
            outcome.status,
            outcome.status.hint()
        );
    }

    let now = ClockTime::from_time(tracker.now().time());
    let started = tracker
        .state()
        .open_since()
        .map_or(now, ClockTime::from_time)
        .display(format);
    let worked = format_minutes(day_total_minutes(tracker.today_segments()));
    match action {
        Action::Start => format!("Started at {started}."),
        Action::Resume => format!("Resumed at {started}."),
        Action::Pause => format!("Paused at {}. Worked today: {worked}.", now.display(format)),
        Action::Stop => format!("Stopped at {}. Worked today: {worked}.", now.display(format)),
    }
}
