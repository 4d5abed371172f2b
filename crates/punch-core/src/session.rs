//! Work session lifecycle.
//!
//! The session is never stored. It is derived from today's segments (plus the
//! day-ended marker) whenever the tracker loads, and advanced by
//! [`SessionState::transition`], which returns the new state together with the
//! store effects the caller must apply.
//!
//! | From    | Action | To      | Effects                              |
//! |---------|--------|---------|--------------------------------------|
//! | idle    | Start  | running | open segment                         |
//! | stopped | Start  | running | clear day-ended marker, open segment |
//! | running | Pause  | paused  | close open segment                   |
//! | paused  | Resume | running | open segment                         |
//! | running | Stop   | stopped | close open segment, mark day ended   |
//! | paused  | Stop   | stopped | mark day ended                       |
//!
//! Any other combination is a no-op without effects.

use std::fmt;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::clock::ClockTime;
use crate::segment::TimeSegment;

/// Display-level session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Running,
    Paused,
    Stopped,
}

impl SessionStatus {
    /// String representation for output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        }
    }

    /// Capitalized label, e.g. `"Running"`.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Running => "Running",
            Self::Paused => "Paused",
            Self::Stopped => "Stopped",
        }
    }

    /// One-line description of what the status means for the user.
    pub const fn hint(self) -> &'static str {
        match self {
            Self::Idle => "Ready to start",
            Self::Running => "Timer is running",
            Self::Paused => "Timer paused, on break",
            Self::Stopped => "Day complete",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The live session, with the open segment's start while running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing recorded today.
    Idle,
    /// A segment is open. `since` has second precision when the segment was
    /// opened by this process and zero seconds when reconstructed.
    Running { since: NaiveTime },
    /// The last segment is closed and the day has not been ended.
    Paused,
    /// The day was ended with a stop.
    Stopped,
}

/// User actions that drive the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Start,
    Pause,
    Resume,
    Stop,
}

impl Action {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Stop => "stop",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A store mutation requested by a transition. All effects apply to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Create a segment starting at `start` with no end.
    OpenSegment { start: ClockTime },
    /// Set `end` on the open segment, if there is one.
    CloseOpenSegment { end: ClockTime },
    /// Record that the day was ended.
    MarkDayEnded { at: ClockTime },
    /// Forget a previous day-ended marker.
    ClearDayEnded,
}

/// Result of [`SessionState::transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: SessionState,
    pub effects: Vec<Effect>,
}

impl Transition {
    const fn stay(state: SessionState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    /// True when the action was not valid from the previous state.
    pub fn is_noop(&self) -> bool {
        self.effects.is_empty()
    }
}

impl SessionState {
    /// Derives the session from today's segments.
    ///
    /// `day_ended` distinguishes a stopped day from a paused one once the last
    /// segment is closed.
    pub fn reconstruct(today: &[TimeSegment], day_ended: bool) -> Self {
        match today.last() {
            None => Self::Idle,
            Some(last) if last.is_open() => Self::Running {
                since: last.start.to_time(),
            },
            Some(_) if day_ended => Self::Stopped,
            Some(_) => Self::Paused,
        }
    }

    pub const fn status(self) -> SessionStatus {
        match self {
            Self::Idle => SessionStatus::Idle,
            Self::Running { .. } => SessionStatus::Running,
            Self::Paused => SessionStatus::Paused,
            Self::Stopped => SessionStatus::Stopped,
        }
    }

    /// When the open segment started, while running.
    pub const fn open_since(self) -> Option<NaiveTime> {
        match self {
            Self::Running { since } => Some(since),
            _ => None,
        }
    }

    /// Applies `action` at wall-clock time `now`.
    pub fn transition(self, action: Action, now: NaiveTime) -> Transition {
        let at = ClockTime::from_time(now);
        match (self, action) {
            (Self::Idle, Action::Start) | (Self::Paused, Action::Resume) => Transition {
                state: Self::Running { since: now },
                effects: vec![Effect::OpenSegment { start: at }],
            },
            (Self::Stopped, Action::Start) => Transition {
                state: Self::Running { since: now },
                effects: vec![Effect::ClearDayEnded, Effect::OpenSegment { start: at }],
            },
            (Self::Running { .. }, Action::Pause) => Transition {
                state: Self::Paused,
                effects: vec![Effect::CloseOpenSegment { end: at }],
            },
            (Self::Running { .. }, Action::Stop) => Transition {
                state: Self::Stopped,
                effects: vec![
                    Effect::CloseOpenSegment { end: at },
                    Effect::MarkDayEnded { at },
                ],
            },
            (Self::Paused, Action::Stop) => Transition {
                state: Self::Stopped,
                effects: vec![Effect::MarkDayEnded { at }],
            },
            (state, _) => Transition::stay(state),
        }
    }
}
