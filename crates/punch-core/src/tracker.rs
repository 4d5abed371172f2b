//! Applies session transitions to a segment store.
//!
//! [`Tracker`] is the only place that mutates segments in response to user
//! actions. It re-reads today's segments before opening or closing one, so a
//! repeated action (a double click, or a second process acting on stale state)
//! can never leave two open segments on the same date.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;
use tracing::{debug, warn};

use crate::aggregate::{
    DayView, WeekView, day_breaks, day_total_minutes, elapsed_seconds, live_seconds,
};
use crate::clock::{
    Clock, ClockError, ClockTime, SystemClock, monday_of, parse_clock_time, week_end,
};
use crate::segment::{SegmentId, SegmentPatch, TimeSegment};
use crate::session::{Action, Effect, SessionState, SessionStatus};
use crate::store::{SegmentStore, StoreError};
use crate::summary::{Summary, summarize};
use crate::ticker::LiveClock;

/// Tracker errors.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// A time typed by the user could not be parsed.
    #[error(transparent)]
    Clock(#[from] ClockError),

    /// The segment store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The edited boundary does not exist on that day.
    #[error("no {target} to edit on {date}")]
    NoSuchTarget { date: NaiveDate, target: EditTarget },
}

/// A boundary in a day's log that can be edited.
///
/// Break indices are zero-based: break `i` lies between segment `i` and
/// segment `i + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    /// Start of the first segment.
    DayStart,
    /// End of the last segment.
    DayEnd,
    /// End of segment `i`.
    BreakStart(usize),
    /// Start of segment `i + 1`.
    BreakEnd(usize),
}

impl EditTarget {
    fn resolve(self, segments: &[TimeSegment], time: ClockTime) -> Option<(SegmentId, SegmentPatch)> {
        match self {
            Self::DayStart => segments
                .first()
                .map(|s| (s.id, SegmentPatch::start(time))),
            Self::DayEnd => segments.last().map(|s| (s.id, SegmentPatch::end(time))),
            Self::BreakStart(i) if i + 1 < segments.len() => {
                Some((segments[i].id, SegmentPatch::end(time)))
            }
            Self::BreakEnd(i) if i + 1 < segments.len() => {
                Some((segments[i + 1].id, SegmentPatch::start(time)))
            }
            Self::BreakStart(_) | Self::BreakEnd(_) => None,
        }
    }
}

impl fmt::Display for EditTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DayStart => f.write_str("start time"),
            Self::DayEnd => f.write_str("end time"),
            Self::BreakStart(i) => write!(f, "break {} start", i + 1),
            Self::BreakEnd(i) => write!(f, "break {} end", i + 1),
        }
    }
}

/// Result of [`Tracker::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub previous: SessionStatus,
    pub status: SessionStatus,
    /// False when the action was not valid from the previous status.
    pub applied: bool,
}

/// Today's session bound to a segment store.
pub struct Tracker<S, C = SystemClock> {
    store: S,
    clock: C,
    today: NaiveDate,
    state: SessionState,
    segments: Vec<TimeSegment>,
}

impl<S: SegmentStore, C: Clock> Tracker<S, C> {
    /// Loads today's segments and reconstructs the session from them.
    pub fn load(store: S, clock: C) -> Result<Self, TrackerError> {
        let today = clock.now().date();
        let mut tracker = Self {
            store,
            clock,
            today,
            state: SessionState::Idle,
            segments: Vec::new(),
        };
        tracker.refresh()?;
        Ok(tracker)
    }

    /// Re-reads today's segments from the store and re-derives the session.
    ///
    /// A running session keeps its second-precision start when the store
    /// still shows the same open segment.
    pub fn refresh(&mut self) -> Result<(), TrackerError> {
        self.today = self.clock.now().date();
        self.segments = self.store.list_by_date(self.today)?;
        let day_ended = self.store.day_ended(self.today)?;
        let reconstructed = SessionState::reconstruct(&self.segments, day_ended);

        self.state = match (self.state.open_since(), reconstructed.open_since()) {
            (Some(current), Some(stored))
                if ClockTime::from_time(current) == ClockTime::from_time(stored) =>
            {
                self.state
            }
            _ => reconstructed,
        };
        debug!(
            today = %self.today,
            status = %self.state.status(),
            segments = self.segments.len(),
            "session refreshed"
        );
        Ok(())
    }

    pub const fn state(&self) -> SessionState {
        self.state
    }

    pub const fn status(&self) -> SessionStatus {
        self.state.status()
    }

    pub const fn today(&self) -> NaiveDate {
        self.today
    }

    /// Today's segments as of the last refresh.
    pub fn today_segments(&self) -> &[TimeSegment] {
        &self.segments
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn clock(&self) -> &C {
        &self.clock
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// Seconds worked today, including the running segment.
    pub fn elapsed_seconds(&self) -> u64 {
        elapsed_seconds(&self.segments, self.state, self.clock.now().time())
    }

    /// Inputs for the live timer while running, `None` otherwise.
    pub fn live_clock(&self) -> Option<LiveClock> {
        let since = self.state.open_since()?;
        Some(LiveClock {
            closed_seconds: u64::try_from(day_total_minutes(&self.segments)).unwrap_or(0) * 60,
            since,
        })
    }

    pub fn start(&mut self) -> Result<Outcome, TrackerError> {
        self.apply(Action::Start)
    }

    pub fn pause(&mut self) -> Result<Outcome, TrackerError> {
        self.apply(Action::Pause)
    }

    pub fn resume(&mut self) -> Result<Outcome, TrackerError> {
        self.apply(Action::Resume)
    }

    pub fn stop(&mut self) -> Result<Outcome, TrackerError> {
        self.apply(Action::Stop)
    }

    /// Performs `action` if it is valid from the current state.
    ///
    /// Invalid actions leave the store untouched. A segment that disappears
    /// mid-transition is not fatal: the session is re-derived from the store.
    pub fn apply(&mut self, action: Action) -> Result<Outcome, TrackerError> {
        let now = self.clock.now();
        if now.date() != self.today {
            self.refresh()?;
        }
        let previous = self.state.status();
        let transition = self.state.transition(action, now.time());
        if transition.is_noop() {
            debug!(%action, status = %previous, "action not valid from current state, ignoring");
            return Ok(Outcome {
                previous,
                status: previous,
                applied: false,
            });
        }

        let mut next = transition.state;
        for effect in transition.effects {
            match self.perform(effect) {
                Ok(Some(adopted)) => next = SessionState::Running { since: adopted.to_time() },
                Ok(None) => {}
                Err(StoreError::NotFound(id)) => {
                    warn!(%id, %action, "segment disappeared during transition, reloading");
                    self.state = SessionState::Idle;
                    self.refresh()?;
                    return Ok(Outcome {
                        previous,
                        status: self.state.status(),
                        applied: false,
                    });
                }
                Err(err) => return Err(err.into()),
            }
        }

        self.state = next;
        self.segments = self.store.list_by_date(self.today)?;
        debug!(%action, from = %previous, to = %self.state.status(), "transition applied");
        Ok(Outcome {
            previous,
            status: self.state.status(),
            applied: true,
        })
    }

    /// Applies one effect to today. Returns the start of an already-open
    /// segment when opening found one.
    fn perform(&mut self, effect: Effect) -> Result<Option<ClockTime>, StoreError> {
        match effect {
            Effect::OpenSegment { start } => {
                let segments = self.store.list_by_date(self.today)?;
                if let Some(open) = segments.iter().find(|s| s.is_open()) {
                    debug!(id = %open.id, start = %open.start, "segment already open, adopting it");
                    return Ok(Some(open.start));
                }
                let created = self.store.create(self.today, start, None)?;
                debug!(id = %created.id, %start, "opened segment");
            }
            Effect::CloseOpenSegment { end } => {
                let segments = self.store.list_by_date(self.today)?;
                match segments.iter().find(|s| s.is_open()) {
                    Some(open) => {
                        self.store.update(open.id, SegmentPatch::end(end))?;
                        debug!(id = %open.id, %end, "closed segment");
                    }
                    None => debug!("no open segment to close"),
                }
            }
            Effect::MarkDayEnded { at } => self.store.mark_day_ended(self.today, at)?,
            Effect::ClearDayEnded => self.store.clear_day_ended(self.today)?,
        }
        Ok(None)
    }

    /// Changes one boundary of `date`'s log to the time typed in `text`.
    ///
    /// Nothing is written when `text` does not parse. Edits that leave a
    /// segment or break running backwards are kept and logged.
    pub fn edit(
        &mut self,
        date: NaiveDate,
        target: EditTarget,
        text: &str,
    ) -> Result<SegmentId, TrackerError> {
        let time = parse_clock_time(text)?;
        let mut segments = self.store.list_by_date(date)?;
        let (id, patch) = target
            .resolve(&segments, time)
            .ok_or(TrackerError::NoSuchTarget { date, target })?;

        if let Err(err) = self.store.update(id, patch) {
            if let StoreError::NotFound(_) = err {
                warn!(%id, %date, "edited segment no longer exists, reloading");
                self.refresh()?;
            }
            return Err(err.into());
        }
        debug!(%id, %date, %target, %time, "segment edited");

        if let Some(segment) = segments.iter_mut().find(|s| s.id == id) {
            patch.apply_to(segment);
        }
        let backwards_segment = segments
            .iter()
            .filter_map(TimeSegment::duration_minutes)
            .any(|minutes| minutes < 0);
        let backwards_break = day_breaks(&segments)
            .iter()
            .any(|b| b.duration_minutes < 0);
        if backwards_segment || backwards_break {
            warn!(%date, %target, %time, "edit left times out of order");
        }

        if date == self.today {
            self.refresh()?;
        }
        Ok(id)
    }

    /// Deletes everything recorded in the week containing `date`.
    ///
    /// Clearing the current week resets the session to idle.
    pub fn clear_week(&mut self, date: NaiveDate) -> Result<usize, TrackerError> {
        let monday = monday_of(date);
        let removed = self.store.delete_by_week(monday)?;
        debug!(%monday, removed, "week cleared");
        if (monday..=week_end(monday)).contains(&self.today) {
            self.state = SessionState::Idle;
            self.refresh()?;
        }
        Ok(removed)
    }

    /// The log for `date`, with live time when it is today.
    pub fn day_view(&self, date: NaiveDate) -> Result<DayView, TrackerError> {
        let segments = if date == self.today {
            self.segments.clone()
        } else {
            self.store.list_by_date(date)?
        };
        Ok(DayView::build(date, segments, self.state, self.clock.now()))
    }

    /// The week containing `date`, with live time for today.
    pub fn week_view(&self, date: NaiveDate) -> Result<WeekView, TrackerError> {
        let monday = monday_of(date);
        let segments = self.store.list_by_week(monday)?;
        let live = self
            .state
            .open_since()
            .map_or(0, |since| live_seconds(since, self.clock.now().time()));
        Ok(WeekView::build(monday, &segments, self.today, live))
    }

    /// Statistics over all closed segments, `None` when nothing is recorded.
    pub fn summary(&self) -> Result<Option<Summary>, TrackerError> {
        Ok(summarize(&self.store.list_closed()?))
    }
}
