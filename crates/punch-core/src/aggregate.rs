//! Day and week aggregation over recorded segments.
//!
//! Everything here is a pure function of a segment list. Open segments never
//! count toward stored totals; live time for a running session is layered on
//! top by [`elapsed_seconds`] so closed segments are not counted twice.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::clock::{ClockTime, week_dates, week_range_label, weekday_name};
use crate::segment::TimeSegment;
use crate::session::SessionState;

/// The gap between two consecutive segments on the same day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Break {
    pub start: ClockTime,
    pub end: ClockTime,
    /// Negative when the segments are out of chronological order.
    pub duration_minutes: i64,
}

/// Totals for one Monday-keyed week.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WeekRollup {
    pub total_minutes: i64,
    pub days_worked: usize,
}

fn closed_minutes<'a>(segments: impl IntoIterator<Item = &'a TimeSegment>) -> i64 {
    segments
        .into_iter()
        .filter_map(TimeSegment::duration_minutes)
        .map(|minutes| minutes.max(0))
        .sum()
}

/// Total minutes of the closed segments in `segments`.
///
/// Each segment contributes `end - start`, floored at zero. Open segments
/// contribute nothing.
pub fn day_total_minutes(segments: &[TimeSegment]) -> i64 {
    closed_minutes(segments)
}

/// Breaks between adjacent segments, in stored order.
///
/// A break is emitted for each pair whose earlier segment is closed. Out of
/// order segments produce negative durations, which are kept as-is.
pub fn day_breaks(segments: &[TimeSegment]) -> Vec<Break> {
    segments
        .windows(2)
        .filter_map(|pair| {
            let end = pair[0].end?;
            let start = pair[1].start;
            Some(Break {
                start: end,
                end: start,
                duration_minutes: end.minutes_until(start),
            })
        })
        .collect()
}

fn group_by_date(segments: &[TimeSegment]) -> BTreeMap<NaiveDate, Vec<&TimeSegment>> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&TimeSegment>> = BTreeMap::new();
    for segment in segments {
        by_date.entry(segment.date).or_default().push(segment);
    }
    by_date
}

/// Total minutes and worked-day count for the week starting at `monday`.
///
/// A day counts as worked when it has at least one segment, whatever its
/// duration. Segments outside the week are ignored.
pub fn week_rollup(monday: NaiveDate, segments: &[TimeSegment]) -> WeekRollup {
    let by_date = group_by_date(segments);
    let mut rollup = WeekRollup::default();
    for date in week_dates(monday) {
        if let Some(day) = by_date.get(&date).filter(|day| !day.is_empty()) {
            rollup.total_minutes += closed_minutes(day.iter().copied());
            rollup.days_worked += 1;
        }
    }
    rollup
}

/// Seconds between `since` and `now`, floored at zero.
pub fn live_seconds(since: NaiveTime, now: NaiveTime) -> u64 {
    u64::try_from(now.signed_duration_since(since).num_seconds()).unwrap_or(0)
}

/// Seconds worked today: closed segments plus the running segment's live time.
///
/// `segments` must be today's segments.
pub fn elapsed_seconds(segments: &[TimeSegment], state: SessionState, now: NaiveTime) -> u64 {
    let closed = u64::try_from(day_total_minutes(segments)).unwrap_or(0) * 60;
    closed + state.open_since().map_or(0, |since| live_seconds(since, now))
}

/// Everything needed to render one day's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayView {
    pub date: NaiveDate,
    pub is_today: bool,
    pub segments: Vec<TimeSegment>,
    /// Start of the first segment.
    pub started: Option<ClockTime>,
    /// End of the last segment, only once every segment is closed.
    pub ended: Option<ClockTime>,
    pub breaks: Vec<Break>,
    pub total_minutes: i64,
    /// Closed time plus live time when the day is today and running.
    pub elapsed_seconds: u64,
}

impl DayView {
    pub fn build(
        date: NaiveDate,
        segments: Vec<TimeSegment>,
        state: SessionState,
        now: NaiveDateTime,
    ) -> Self {
        let is_today = date == now.date();
        let started = segments.first().map(|s| s.start);
        let ended = if segments.iter().all(|s| !s.is_open()) {
            segments.last().and_then(|s| s.end)
        } else {
            None
        };
        let total_minutes = day_total_minutes(&segments);
        let elapsed_seconds = if is_today {
            elapsed_seconds(&segments, state, now.time())
        } else {
            u64::try_from(total_minutes).unwrap_or(0) * 60
        };
        Self {
            date,
            is_today,
            started,
            ended,
            breaks: day_breaks(&segments),
            total_minutes,
            elapsed_seconds,
            segments,
        }
    }

    /// Whether any break or segment in the day runs backwards.
    pub fn has_out_of_order_times(&self) -> bool {
        self.breaks.iter().any(|b| b.duration_minutes < 0)
            || self
                .segments
                .iter()
                .filter_map(TimeSegment::duration_minutes)
                .any(|minutes| minutes < 0)
    }
}

/// One day's pill in the week view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub weekday: String,
    pub worked: bool,
    pub minutes: i64,
    pub is_today: bool,
}

/// Everything needed to render a week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekView {
    pub monday: NaiveDate,
    pub label: String,
    pub days: Vec<DaySummary>,
    pub total_minutes: i64,
    pub days_worked: usize,
}

impl WeekView {
    /// Builds the week starting at `monday`.
    ///
    /// `live_seconds` is the running segment's live time; it is added to
    /// `today` when today falls inside the week.
    pub fn build(
        monday: NaiveDate,
        segments: &[TimeSegment],
        today: NaiveDate,
        live_seconds: u64,
    ) -> Self {
        let by_date = group_by_date(segments);
        let rollup = week_rollup(monday, segments);
        let live_minutes = i64::try_from(live_seconds / 60).unwrap_or(i64::MAX);

        let mut total_minutes = rollup.total_minutes;
        let days = week_dates(monday)
            .map(|date| {
                let day = by_date.get(&date);
                let is_today = date == today;
                let mut minutes = day.map_or(0, |day| closed_minutes(day.iter().copied()));
                if is_today {
                    minutes += live_minutes;
                    total_minutes += live_minutes;
                }
                DaySummary {
                    date,
                    weekday: weekday_name(date),
                    worked: day.is_some_and(|day| !day.is_empty()),
                    minutes,
                    is_today,
                }
            })
            .collect();

        Self {
            monday,
            label: week_range_label(monday),
            days,
            total_minutes,
            days_worked: rollup.days_worked,
        }
    }
}
