//! Core domain logic for punch.
//!
//! This crate contains the fundamental types and logic for:
//! - Clock arithmetic: parsing and formatting wall-clock times and durations
//! - Segments: the recorded intervals of work and the store they live in
//! - Sessions: the start/pause/resume/stop lifecycle and its store effects
//! - Aggregation: day, week and all-time totals derived from segments
//!
//! Nothing here talks to a database; see `punch-db` for the `SQLite` store.

pub mod aggregate;
pub mod clock;
pub mod segment;
pub mod session;
pub mod store;
pub mod summary;
pub mod ticker;
pub mod tracker;

pub use aggregate::{Break, DaySummary, DayView, WeekRollup, WeekView};
pub use clock::{
    Clock, ClockError, ClockFormat, ClockTime, ManualClock, SystemClock, format_elapsed,
    format_minutes, monday_of, parse_clock_time,
};
pub use segment::{SegmentId, SegmentPatch, TimeSegment};
pub use session::{Action, SessionState, SessionStatus};
pub use store::{MemoryStore, SegmentStore, StoreError};
pub use summary::{MonthSummary, Summary, summarize};
pub use ticker::{LiveClock, Ticker};
pub use tracker::{EditTarget, Outcome, Tracker, TrackerError};
