//! Recorded work segments.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clock::ClockTime;

/// Store-assigned segment identifier.
///
/// Identifiers increase with insertion, so sorting a day's segments by ID
/// recovers the order they were recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(i64);

impl SegmentId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One contiguous interval of work on a calendar date.
///
/// A segment without an `end` is open: work is still in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSegment {
    pub id: SegmentId,
    pub date: NaiveDate,
    pub start: ClockTime,
    pub end: Option<ClockTime>,
}

impl TimeSegment {
    pub const fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Signed length of a closed segment in minutes.
    ///
    /// Returns `None` for open segments. The value is negative when the end
    /// was edited to before the start.
    pub fn duration_minutes(&self) -> Option<i64> {
        self.end.map(|end| self.start.minutes_until(end))
    }
}

/// Fields to change on an existing segment. Unset fields are left alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentPatch {
    pub start: Option<ClockTime>,
    pub end: Option<ClockTime>,
}

impl SegmentPatch {
    pub const fn start(start: ClockTime) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    pub const fn end(end: ClockTime) -> Self {
        Self {
            start: None,
            end: Some(end),
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Applies the patch to `segment` in place.
    pub fn apply_to(&self, segment: &mut TimeSegment) {
        if let Some(start) = self.start {
            segment.start = start;
        }
        if let Some(end) = self.end {
            segment.end = Some(end);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(start: &str, end: Option<&str>) -> TimeSegment {
        TimeSegment {
            id: SegmentId::new(1),
            date: "2024-01-01".parse().unwrap(),
            start: start.parse().unwrap(),
            end: end.map(|e| e.parse().unwrap()),
        }
    }

    #[test]
    fn duration_is_signed_for_closed_segments() {
        assert_eq!(segment("09:00", Some("12:00")).duration_minutes(), Some(180));
        assert_eq!(segment("12:00", Some("11:30")).duration_minutes(), Some(-30));
        assert_eq!(segment("09:00", None).duration_minutes(), None);
    }

    #[test]
    fn patch_only_touches_set_fields() {
        let mut seg = segment("09:00", None);
        SegmentPatch::end("10:15".parse().unwrap()).apply_to(&mut seg);
        assert_eq!(seg.start, "09:00".parse().unwrap());
        assert_eq!(seg.end, Some("10:15".parse().unwrap()));
        assert!(SegmentPatch::default().is_empty());
    }

    #[test]
    fn serializes_times_as_clock_strings() {
        let json = serde_json::to_string(&segment("09:00", Some("17:30"))).unwrap();
        assert_eq!(
            json,
            r#"{"id":1,"date":"2024-01-01","start":"09:00","end":"17:30"}"#
        );
    }
}
