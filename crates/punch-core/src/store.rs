//! The segment store seam.
//!
//! The core never talks to a database directly. Everything it needs from
//! persistence goes through [`SegmentStore`]; `punch-db` provides the SQLite
//! implementation and [`MemoryStore`] keeps everything in process.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use thiserror::Error;

use crate::clock::{ClockTime, week_end};
use crate::segment::{SegmentId, SegmentPatch, TimeSegment};

/// Errors from segment store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No segment has the given ID.
    #[error("segment {0} not found")]
    NotFound(SegmentId),

    /// An update was requested without a start or end time.
    #[error("nothing to update: provide a start or end time")]
    NothingToUpdate,

    /// The underlying storage failed.
    #[error("storage error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Persistence operations the tracker depends on.
///
/// Segments returned for a date are ordered by ID. Absence of data is never an
/// error: unknown dates and weeks yield empty lists.
pub trait SegmentStore {
    /// Segments for one date in recording order.
    fn list_by_date(&self, date: NaiveDate) -> Result<Vec<TimeSegment>, StoreError>;

    /// Segments for the seven dates starting at `monday`, ordered by date then ID.
    fn list_by_week(&self, monday: NaiveDate) -> Result<Vec<TimeSegment>, StoreError>;

    /// Every closed segment across all history, ordered by date then ID.
    fn list_closed(&self) -> Result<Vec<TimeSegment>, StoreError>;

    /// Records a new segment and assigns its ID.
    fn create(
        &mut self,
        date: NaiveDate,
        start: ClockTime,
        end: Option<ClockTime>,
    ) -> Result<TimeSegment, StoreError>;

    /// Changes the start and/or end of an existing segment.
    fn update(&mut self, id: SegmentId, patch: SegmentPatch) -> Result<(), StoreError>;

    /// Removes every segment and day-ended marker in the week starting at
    /// `monday`. Returns the number of segments removed.
    fn delete_by_week(&mut self, monday: NaiveDate) -> Result<usize, StoreError>;

    /// Whether the day was explicitly ended with a stop.
    fn day_ended(&self, date: NaiveDate) -> Result<bool, StoreError>;

    /// Marks the day as ended at `at`.
    fn mark_day_ended(&mut self, date: NaiveDate, at: ClockTime) -> Result<(), StoreError>;

    /// Clears the day-ended marker, if any.
    fn clear_day_ended(&mut self, date: NaiveDate) -> Result<(), StoreError>;
}

impl<S: SegmentStore + ?Sized> SegmentStore for &mut S {
    fn list_by_date(&self, date: NaiveDate) -> Result<Vec<TimeSegment>, StoreError> {
        (**self).list_by_date(date)
    }

    fn list_by_week(&self, monday: NaiveDate) -> Result<Vec<TimeSegment>, StoreError> {
        (**self).list_by_week(monday)
    }

    fn list_closed(&self) -> Result<Vec<TimeSegment>, StoreError> {
        (**self).list_closed()
    }

    fn create(
        &mut self,
        date: NaiveDate,
        start: ClockTime,
        end: Option<ClockTime>,
    ) -> Result<TimeSegment, StoreError> {
        (**self).create(date, start, end)
    }

    fn update(&mut self, id: SegmentId, patch: SegmentPatch) -> Result<(), StoreError> {
        (**self).update(id, patch)
    }

    fn delete_by_week(&mut self, monday: NaiveDate) -> Result<usize, StoreError> {
        (**self).delete_by_week(monday)
    }

    fn day_ended(&self, date: NaiveDate) -> Result<bool, StoreError> {
        (**self).day_ended(date)
    }

    fn mark_day_ended(&mut self, date: NaiveDate, at: ClockTime) -> Result<(), StoreError> {
        (**self).mark_day_ended(date, at)
    }

    fn clear_day_ended(&mut self, date: NaiveDate) -> Result<(), StoreError> {
        (**self).clear_day_ended(date)
    }
}

/// An in-process segment store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    next_id: i64,
    segments: Vec<TimeSegment>,
    ended: BTreeMap<NaiveDate, ClockTime>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted(&self, mut keep: impl FnMut(&TimeSegment) -> bool) -> Vec<TimeSegment> {
        let mut segments: Vec<_> = self.segments.iter().filter(|s| keep(*s)).cloned().collect();
        segments.sort_by_key(|s| (s.date, s.id));
        segments
    }
}

impl SegmentStore for MemoryStore {
    fn list_by_date(&self, date: NaiveDate) -> Result<Vec<TimeSegment>, StoreError> {
        Ok(self.sorted(|s| s.date == date))
    }

    fn list_by_week(&self, monday: NaiveDate) -> Result<Vec<TimeSegment>, StoreError> {
        let sunday = week_end(monday);
        Ok(self.sorted(|s| (monday..=sunday).contains(&s.date)))
    }

    fn list_closed(&self) -> Result<Vec<TimeSegment>, StoreError> {
        Ok(self.sorted(|s| !s.is_open()))
    }

    fn create(
        &mut self,
        date: NaiveDate,
        start: ClockTime,
        end: Option<ClockTime>,
    ) -> Result<TimeSegment, StoreError> {
        self.next_id += 1;
        let segment = TimeSegment {
            id: SegmentId::new(self.next_id),
            date,
            start,
            end,
        };
        self.segments.push(segment.clone());
        Ok(segment)
    }

    fn update(&mut self, id: SegmentId, patch: SegmentPatch) -> Result<(), StoreError> {
        if patch.is_empty() {
            return Err(StoreError::NothingToUpdate);
        }
        let segment = self
            .segments
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StoreError::NotFound(id))?;
        patch.apply_to(segment);
        Ok(())
    }

    fn delete_by_week(&mut self, monday: NaiveDate) -> Result<usize, StoreError> {
        let week = monday..=week_end(monday);
        let before = self.segments.len();
        self.segments.retain(|s| !week.contains(&s.date));
        self.ended.retain(|date, _| !week.contains(date));
        Ok(before - self.segments.len())
    }

    fn day_ended(&self, date: NaiveDate) -> Result<bool, StoreError> {
        Ok(self.ended.contains_key(&date))
    }

    fn mark_day_ended(&mut self, date: NaiveDate, at: ClockTime) -> Result<(), StoreError> {
        self.ended.insert(date, at);
        Ok(())
    }

    fn clear_day_ended(&mut self, date: NaiveDate) -> Result<(), StoreError> {
        self.ended.remove(&date);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn time(s: &str) -> ClockTime {
        s.parse().unwrap()
    }

    #[test]
    fn lists_by_date_in_insertion_order() {
        let mut store = MemoryStore::new();
        store.create(date("2024-01-02"), time("13:00"), None).unwrap();
        store
            .create(date("2024-01-01"), time("09:00"), Some(time("12:00")))
            .unwrap();
        store.create(date("2024-01-02"), time("08:00"), None).unwrap();

        let day = store.list_by_date(date("2024-01-02")).unwrap();
        let starts: Vec<_> = day.iter().map(|s| s.start.to_string()).collect();
        assert_eq!(starts, ["13:00", "08:00"]);
        assert!(store.list_by_date(date("2024-01-05")).unwrap().is_empty());
    }

    #[test]
    fn lists_week_by_date_then_id() {
        let mut store = MemoryStore::new();
        store.create(date("2024-01-03"), time("09:00"), None).unwrap();
        store.create(date("2024-01-01"), time("10:00"), None).unwrap();
        store.create(date("2024-01-08"), time("11:00"), None).unwrap();
        store.create(date("2024-01-07"), time("12:00"), None).unwrap();

        let week = store.list_by_week(date("2024-01-01")).unwrap();
        let dates: Vec<_> = week.iter().map(|s| s.date.to_string()).collect();
        assert_eq!(dates, ["2024-01-01", "2024-01-03", "2024-01-07"]);
    }

    #[test]
    fn update_rejects_empty_patch_and_unknown_id() {
        let mut store = MemoryStore::new();
        let seg = store.create(date("2024-01-01"), time("09:00"), None).unwrap();

        assert!(matches!(
            store.update(seg.id, SegmentPatch::default()),
            Err(StoreError::NothingToUpdate)
        ));
        assert!(matches!(
            store.update(SegmentId::new(99), SegmentPatch::end(time("10:00"))),
            Err(StoreError::NotFound(id)) if id == SegmentId::new(99)
        ));

        store.update(seg.id, SegmentPatch::end(time("10:00"))).unwrap();
        assert_eq!(store.list_closed().unwrap().len(), 1);
    }

    #[test]
    fn delete_by_week_removes_segments_and_markers() {
        let mut store = MemoryStore::new();
        store.create(date("2024-01-01"), time("09:00"), None).unwrap();
        store.create(date("2024-01-07"), time("09:00"), None).unwrap();
        store.create(date("2024-01-08"), time("09:00"), None).unwrap();
        store.mark_day_ended(date("2024-01-07"), time("17:00")).unwrap();
        store.mark_day_ended(date("2024-01-08"), time("17:00")).unwrap();

        assert_eq!(store.delete_by_week(date("2024-01-01")).unwrap(), 2);
        assert!(store.list_by_week(date("2024-01-01")).unwrap().is_empty());
        assert!(!store.day_ended(date("2024-01-07")).unwrap());
        assert!(store.day_ended(date("2024-01-08")).unwrap());
        assert_eq!(store.delete_by_week(date("2024-01-01")).unwrap(), 0);
    }
}
