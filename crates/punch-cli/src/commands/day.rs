//! Day command: one date's segments, breaks and total.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use punch_core::aggregate::DayView;
use punch_core::clock::{
    Clock, ClockFormat, date_header, format_decimal_hours, format_elapsed, format_minutes,
};
use punch_core::session::SessionStatus;
use punch_core::store::SegmentStore;
use punch_core::tracker::Tracker;

pub fn run<W: Write, S: SegmentStore, C: Clock>(
    writer: &mut W,
    tracker: &Tracker<S, C>,
    date: NaiveDate,
    json: bool,
    format: ClockFormat,
) -> Result<()> {
    let view = tracker
        .day_view(date)
        .with_context(|| format!("failed to load segments for {date}"))?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&view)?)?;
    } else {
        let status = view.is_today.then(|| tracker.status());
        write!(writer, "{}", format_day(&view, status, format))?;
    }
    Ok(())
}

/// Like [`format_minutes`] but keeps the sign of backwards intervals.
fn format_signed_minutes(minutes: i64) -> String {
    if minutes < 0 {
        format!("-{}", format_minutes(-minutes))
    } else {
        format_minutes(minutes)
    }
}

/// Renders a day's log. `status` is shown when the day is today.
pub fn format_day(view: &DayView, status: Option<SessionStatus>, format: ClockFormat) -> String {
    let mut output = String::new();
    let today = if view.is_today { " (today)" } else { "" };
    writeln!(output, "{}{today}", date_header(view.date)).unwrap();
    if let Some(status) = status {
        writeln!(output, "Status: {}", status.label()).unwrap();
    }

    if view.segments.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "No time recorded.").unwrap();
        return output;
    }

    writeln!(output).unwrap();
    writeln!(output, "Segments:").unwrap();
    for (i, segment) in view.segments.iter().enumerate() {
        let start = segment.start.display(format);
        match (segment.end, segment.duration_minutes()) {
            (Some(end), Some(minutes)) => writeln!(
                output,
                "  {}. {start} - {}  {}",
                i + 1,
                end.display(format),
                format_signed_minutes(minutes)
            )
            .unwrap(),
            _ => writeln!(output, "  {}. {start} - running", i + 1).unwrap(),
        }
    }

    if !view.breaks.is_empty() {
        writeln!(output, "Breaks:").unwrap();
        for (i, b) in view.breaks.iter().enumerate() {
            writeln!(
                output,
                "  {}. {} - {}  {}",
                i + 1,
                b.start.display(format),
                b.end.display(format),
                format_signed_minutes(b.duration_minutes)
            )
            .unwrap();
        }
    }

    writeln!(output).unwrap();
    writeln!(
        output,
        "Total: {} ({})",
        format_minutes(view.total_minutes),
        format_decimal_hours(view.total_minutes)
    )
    .unwrap();
    if view.is_today {
        writeln!(output, "Elapsed: {}", format_elapsed(view.elapsed_seconds)).unwrap();
    }
    if view.has_out_of_order_times() {
        writeln!(output).unwrap();
        writeln!(
            output,
            "Warning: some times are out of order. Check them with 'punch edit'."
        )
        .unwrap();
    }
    output
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDateTime, NaiveTime};
    use insta::assert_snapshot;
    use punch_core::segment::{SegmentId, TimeSegment};
    use punch_core::session::SessionState;

    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn seg(id: i64, start: &str, end: Option<&str>) -> TimeSegment {
        TimeSegment {
            id: SegmentId::new(id),
            date: day(),
            start: start.parse().unwrap(),
            end: end.map(|e| e.parse().unwrap()),
        }
    }

    fn now(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn past_day_with_break() {
        let view = DayView::build(
            day(),
            vec![seg(1, "09:00", Some("12:00")), seg(2, "13:00", Some("17:30"))],
            SessionState::Idle,
            now(2, 9, 0),
        );
        let output = format_day(&view, None, ClockFormat::H24);
        assert_snapshot!(output, @r"
        Monday, January 1, 2024

        Segments:
          1. 09:00 - 12:00  3h 0m
          2. 13:00 - 17:30  4h 30m
        Breaks:
          1. 12:00 - 13:00  1h 0m

        Total: 7h 30m (7.5h)
        ");
    }

    #[test]
    fn today_while_running() {
        let state = SessionState::Running {
            since: NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
        };
        let view = DayView::build(
            day(),
            vec![seg(1, "09:00", Some("12:00")), seg(2, "13:00", None)],
            state,
            now(1, 13, 45),
        );
        let output = format_day(&view, Some(state.status()), ClockFormat::H12);
        assert_snapshot!(output, @r"
        Monday, January 1, 2024 (today)
        Status: Running

        Segments:
          1. 9:00 AM - 12:00 PM  3h 0m
          2. 1:00 PM - running
        Breaks:
          1. 12:00 PM - 1:00 PM  1h 0m

        Total: 3h 0m (3.0h)
        Elapsed: 03:45:00
        ");
    }

    #[test]
    fn empty_day() {
        let view = DayView::build(day(), Vec::new(), SessionState::Idle, now(3, 9, 0));
        let output = format_day(&view, None, ClockFormat::H24);
        assert_snapshot!(output, @r"
        Monday, January 1, 2024

        No time recorded.
        ");
    }

    #[test]
    fn out_of_order_times_are_flagged() {
        let view = DayView::build(
            day(),
            vec![seg(1, "09:00", Some("12:00")), seg(2, "11:00", Some("12:30"))],
            SessionState::Idle,
            now(2, 9, 0),
        );
        let output = format_day(&view, None, ClockFormat::H24);
        assert_snapshot!(output, @r"
        Monday, January 1, 2024

        Segments:
          1. 09:00 - 12:00  3h 0m
          2. 11:00 - 12:30  1h 30m
        Breaks:
          1. 12:00 - 11:00  -1h 0m

        Total: 4h 30m (4.5h)

        Warning: some times are out of order. Check them with 'punch edit'.
        ");
    }
}
