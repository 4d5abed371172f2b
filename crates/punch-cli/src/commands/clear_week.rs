//! Clear-week command: delete everything recorded in one week.

use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use punch_core::clock::{Clock, monday_of, week_range_label};
use punch_core::store::SegmentStore;
use punch_core::tracker::Tracker;

pub fn run<W: Write, S: SegmentStore, C: Clock>(
    writer: &mut W,
    tracker: &mut Tracker<S, C>,
    date: NaiveDate,
    confirmed: bool,
) -> Result<()> {
    let label = week_range_label(monday_of(date));
    if !confirmed {
        bail!("refusing to clear the week of {label} without --yes");
    }

    let removed = tracker
        .clear_week(date)
        .with_context(|| format!("failed to clear the week of {label}"))?;
    let plural = if removed == 1 { "" } else { "s" };
    writeln!(writer, "Cleared {removed} segment{plural} from the week of {label}.")?;
    Ok(())
}
