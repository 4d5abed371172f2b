//! Edit command: correct one recorded time.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use punch_core::clock::{Clock, ClockFormat, parse_clock_time};
use punch_core::store::SegmentStore;
use punch_core::tracker::{EditTarget, Tracker};

use crate::cli::EditField;

/// Maps a CLI field and 1-based break number to an edit target.
pub fn edit_target(field: EditField, index: usize) -> Result<EditTarget> {
    let break_index = || {
        index
            .checked_sub(1)
            .context("break numbers start at 1")
    };
    Ok(match field {
        EditField::Start => EditTarget::DayStart,
        EditField::End => EditTarget::DayEnd,
        EditField::BreakStart => EditTarget::BreakStart(break_index()?),
        EditField::BreakEnd => EditTarget::BreakEnd(break_index()?),
    })
}

pub fn run<W: Write, S: SegmentStore, C: Clock>(
    writer: &mut W,
    tracker: &mut Tracker<S, C>,
    date: NaiveDate,
    target: EditTarget,
    value: &str,
    format: ClockFormat,
) -> Result<()> {
    tracker
        .edit(date, target, value)
        .with_context(|| format!("failed to edit {target} on {date}"))?;
    let time = parse_clock_time(value)?;
    writeln!(
        writer,
        "Updated {target} on {date} to {}.",
        time.display(format)
    )?;

    let view = tracker.day_view(date)?;
    if view.has_out_of_order_times() {
        writeln!(
            writer,
            "Warning: times on {date} are now out of order. Run 'punch day {date}' to review."
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use insta::assert_snapshot;
    use punch_core::clock::{ClockTime, ManualClock};
    use punch_core::store::MemoryStore;

    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn time(s: &str) -> ClockTime {
        s.parse().unwrap()
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(day().and_hms_opt(18, 0, 0).unwrap()))
    }

    fn store_with_day() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.create(day(), time("09:00"), Some(time("12:00"))).unwrap();
        store.create(day(), time("13:00"), Some(time("17:00"))).unwrap();
        store
    }

    #[test]
    fn targets_use_one_based_break_numbers() {
        assert_eq!(edit_target(EditField::Start, 0).unwrap(), EditTarget::DayStart);
        assert_eq!(
            edit_target(EditField::BreakStart, 1).unwrap(),
            EditTarget::BreakStart(0)
        );
        assert_eq!(
            edit_target(EditField::BreakEnd, 3).unwrap(),
            EditTarget::BreakEnd(2)
        );
        assert!(edit_target(EditField::BreakEnd, 0).is_err());
    }

    #[test]
    fn edit_reports_new_time() {
        let mut store = store_with_day();
        let mut tracker = Tracker::load(&mut store, clock()).unwrap();
        let mut output = Vec::new();

        run(
            &mut output,
            &mut tracker,
            day(),
            EditTarget::BreakEnd(0),
            "12:45",
            ClockFormat::H24,
        )
        .unwrap();
        run(
            &mut output,
            &mut tracker,
            day(),
            EditTarget::DayStart,
            "8:15 am",
            ClockFormat::H12,
        )
        .unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Updated break 1 end on 2024-01-01 to 12:45.
        Updated start time on 2024-01-01 to 8:15 AM.
        ");
    }

    #[test]
    fn edit_warns_when_times_run_backwards() {
        let mut store = store_with_day();
        let mut tracker = Tracker::load(&mut store, clock()).unwrap();
        let mut output = Vec::new();

        run(
            &mut output,
            &mut tracker,
            day(),
            EditTarget::BreakEnd(0),
            "11:00",
            ClockFormat::H24,
        )
        .unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Updated break 1 end on 2024-01-01 to 11:00.
        Warning: times on 2024-01-01 are now out of order. Run 'punch day 2024-01-01' to review.
        ");
    }

    #[test]
    fn invalid_time_is_an_error() {
        let mut store = store_with_day();
        let mut tracker = Tracker::load(&mut store, clock()).unwrap();
        let mut output = Vec::new();

        let err = run(
            &mut output,
            &mut tracker,
            day(),
            EditTarget::DayEnd,
            "25:00",
            ClockFormat::H24,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("invalid time"));
        assert!(output.is_empty());
    }
}
