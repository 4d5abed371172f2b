//! Clock-time parsing and formatting, calendar helpers, and the wall clock.
//!
//! Times of day are kept as whole minutes since local midnight ([`ClockTime`]).
//! Seconds only matter for the live timer, which reads them straight from a
//! [`Clock`].

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use chrono::{Datelike, Days, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `HH:MM`, one or two hour digits.
static CLOCK_24H_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{1,2}):([0-9]{2})$").unwrap());

/// `h:mm AM/PM`, matched against upper-cased input.
static CLOCK_12H_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{1,2}):([0-9]{2})\s*(AM|PM)$").unwrap());

/// Errors from parsing clock times.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClockError {
    /// The text is not a valid `HH:MM` or `h:mm AM/PM` time.
    #[error("invalid time {input:?}: expected HH:MM or h:mm AM/PM")]
    InvalidFormat { input: String },
}

/// A local time of day with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u16);

impl ClockTime {
    /// Creates a time from 24-hour components, or `None` when out of range.
    pub const fn new(hour: u16, minute: u16) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self(hour * 60 + minute))
        } else {
            None
        }
    }

    /// Truncates a wall-clock time to the minute.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "hour < 24 and minute < 60 always fit in u16"
    )]
    pub fn from_time(time: NaiveTime) -> Self {
        Self(time.hour() as u16 * 60 + time.minute() as u16)
    }

    /// Minutes since midnight.
    pub const fn minutes(self) -> i64 {
        self.0 as i64
    }

    pub const fn hour(self) -> u16 {
        self.0 / 60
    }

    pub const fn minute(self) -> u16 {
        self.0 % 60
    }

    /// The wall-clock time at the start of this minute (seconds are zero).
    pub fn to_time(self) -> NaiveTime {
        NaiveTime::default() + Duration::minutes(self.minutes())
    }

    /// Signed minutes from `self` to `later`; negative when `later` is earlier.
    pub const fn minutes_until(self, later: Self) -> i64 {
        later.minutes() - self.minutes()
    }

    /// Renders the time in the requested display format.
    pub fn display(self, format: ClockFormat) -> String {
        match format {
            ClockFormat::H24 => self.to_string(),
            ClockFormat::H12 => {
                let period = if self.hour() >= 12 { "PM" } else { "AM" };
                let hour = match self.hour() {
                    0 => 12,
                    h if h > 12 => h - 12,
                    h => h,
                };
                format!("{hour}:{:02} {period}", self.minute())
            }
        }
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for ClockTime {
    type Err = ClockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_clock_time(s)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ClockError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_clock_time(&value)
    }
}

impl From<ClockTime> for String {
    fn from(time: ClockTime) -> Self {
        time.to_string()
    }
}

/// Parses `HH:MM` (24-hour) or `h:mm AM/PM` (12-hour) into a [`ClockTime`].
///
/// Surrounding whitespace is ignored and the period is case-insensitive.
/// Out-of-range components are rejected rather than wrapped.
pub fn parse_clock_time(text: &str) -> Result<ClockTime, ClockError> {
    let invalid = || ClockError::InvalidFormat {
        input: text.to_string(),
    };
    let normalized = text.trim().to_uppercase();

    if let Some(caps) = CLOCK_12H_RE.captures(&normalized) {
        let hour: u16 = caps[1].parse().map_err(|_| invalid())?;
        let minute: u16 = caps[2].parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&hour) || minute > 59 {
            return Err(invalid());
        }
        let hour = match (&caps[3], hour) {
            ("AM", 12) => 0,
            ("PM", h) if h != 12 => h + 12,
            (_, h) => h,
        };
        return ClockTime::new(hour, minute).ok_or_else(invalid);
    }

    if let Some(caps) = CLOCK_24H_RE.captures(&normalized) {
        let hour: u16 = caps[1].parse().map_err(|_| invalid())?;
        let minute: u16 = caps[2].parse().map_err(|_| invalid())?;
        return ClockTime::new(hour, minute).ok_or_else(invalid);
    }

    Err(invalid())
}

/// Display preference for times of day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClockFormat {
    #[default]
    #[serde(rename = "24h")]
    H24,
    #[serde(rename = "12h")]
    H12,
}

impl ClockFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::H24 => "24h",
            Self::H12 => "12h",
        }
    }
}

impl fmt::Display for ClockFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Formats minutes as `"Xh Ym"`. Negative input is shown as `0h 0m`.
pub fn format_minutes(minutes: i64) -> String {
    let minutes = minutes.max(0);
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Formats minutes as decimal hours with one digit, e.g. `"7.5h"`.
pub fn format_decimal_hours(minutes: i64) -> String {
    // Tenths of an hour are 6 minutes; round half up.
    let tenths = (minutes.max(0) * 2 + 6) / 12;
    format!("{}.{}h", tenths / 10, tenths % 10)
}

/// Formats a duration in seconds as zero-padded `HH:MM:SS`.
pub fn format_elapsed(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// The Monday on or before `date`. Sunday belongs to the week that started
/// six days earlier.
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    let days_since_monday = date.weekday().num_days_from_monday();
    date - Duration::days(i64::from(days_since_monday))
}

/// Like [`monday_of`], but `None` when any day of the week falls outside the
/// representable calendar.
pub fn checked_monday_of(date: NaiveDate) -> Option<NaiveDate> {
    let days_since_monday = date.weekday().num_days_from_monday();
    let monday = date.checked_sub_days(Days::new(u64::from(days_since_monday)))?;
    monday.checked_add_days(Days::new(6))?;
    Some(monday)
}

/// Calendar-correct date arithmetic; `n` may be negative.
pub fn add_days(date: NaiveDate, n: i64) -> NaiveDate {
    date + Duration::days(n)
}

/// The seven dates Monday through Sunday of the week starting at `monday`.
pub fn week_dates(monday: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    monday.iter_days().take(7)
}

/// The last date (Sunday) of the week starting at `monday`.
pub fn week_end(monday: NaiveDate) -> NaiveDate {
    add_days(monday, 6)
}

/// Full English weekday name, e.g. `"Monday"`.
pub fn weekday_name(date: NaiveDate) -> String {
    date.format("%A").to_string()
}

/// Short label for a week, e.g. `"Jan 1 – Jan 7"`.
pub fn week_range_label(monday: NaiveDate) -> String {
    format!(
        "{} – {}",
        monday.format("%b %-d"),
        week_end(monday).format("%b %-d")
    )
}

/// Long date header, e.g. `"Monday, January 1, 2024"`.
pub fn date_header(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

/// Source of local wall-clock time.
pub trait Clock: Send + Sync {
    /// Current local date and time, second precision or better.
    fn now(&self) -> NaiveDateTime;
}

/// Reads the system's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    pub const fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn parses_24_hour_times() {
        assert_eq!(parse_clock_time("09:00").unwrap().minutes(), 540);
        assert_eq!(parse_clock_time("9:05").unwrap().minutes(), 545);
        assert_eq!(parse_clock_time("00:00").unwrap().minutes(), 0);
        assert_eq!(parse_clock_time(" 23:59 ").unwrap().minutes(), 1439);
    }

    #[test]
    fn parses_12_hour_times() {
        assert_eq!(parse_clock_time("12:30 AM").unwrap().minutes(), 30);
        assert_eq!(parse_clock_time("12:30 pm").unwrap().minutes(), 750);
        assert_eq!(parse_clock_time("1:15PM").unwrap().minutes(), 795);
        assert_eq!(parse_clock_time("11:59 am").unwrap().minutes(), 719);
    }

    #[test]
    fn rejects_malformed_times() {
        for input in [
            "", "24:00", "12:60", "9", "9:5", "09-00", "0:30 AM", "13:00 PM", "12:00 XM",
            "1:2:3", "abc", "-1:00",
        ] {
            assert_eq!(
                parse_clock_time(input),
                Err(ClockError::InvalidFormat {
                    input: input.to_string()
                }),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn every_minute_roundtrips_through_display() {
        for minutes in 0..24 * 60 {
            let time = ClockTime::new(minutes / 60, minutes % 60).unwrap();
            assert_eq!(parse_clock_time(&time.to_string()), Ok(time));
            assert_eq!(
                parse_clock_time(&time.display(ClockFormat::H12)),
                Ok(time)
            );
        }
    }

    #[test]
    fn twelve_hour_display() {
        let noon = ClockTime::new(12, 0).unwrap();
        let midnight = ClockTime::new(0, 0).unwrap();
        let evening = ClockTime::new(18, 7).unwrap();
        assert_eq!(noon.display(ClockFormat::H12), "12:00 PM");
        assert_eq!(midnight.display(ClockFormat::H12), "12:00 AM");
        assert_eq!(evening.display(ClockFormat::H12), "6:07 PM");
        assert_eq!(evening.display(ClockFormat::H24), "18:07");
    }

    #[test]
    fn from_time_truncates_seconds() {
        let time = NaiveTime::from_hms_opt(9, 41, 59).unwrap();
        assert_eq!(ClockTime::from_time(time), ClockTime::new(9, 41).unwrap());
        assert_eq!(
            ClockTime::new(9, 41).unwrap().to_time(),
            NaiveTime::from_hms_opt(9, 41, 0).unwrap()
        );
    }

    #[test]
    fn format_minutes_clamps_negative() {
        assert_eq!(format_minutes(420), "7h 0m");
        assert_eq!(format_minutes(61), "1h 1m");
        assert_eq!(format_minutes(0), "0h 0m");
        assert_eq!(format_minutes(-30), "0h 0m");
    }

    #[test]
    fn format_decimal_hours_rounds_to_tenths() {
        assert_eq!(format_decimal_hours(450), "7.5h");
        assert_eq!(format_decimal_hours(360), "6.0h");
        assert_eq!(format_decimal_hours(62), "1.0h");
        assert_eq!(format_decimal_hours(63), "1.1h");
        assert_eq!(format_decimal_hours(-10), "0.0h");
    }

    #[test]
    fn format_elapsed_pads_components() {
        assert_eq!(format_elapsed(0), "00:00:00");
        assert_eq!(format_elapsed(3_723), "01:02:03");
        assert_eq!(format_elapsed(360_000), "100:00:00");
    }

    #[test]
    fn monday_of_treats_sunday_as_last_day() {
        // 2024-01-01 is a Monday.
        assert_eq!(monday_of(date("2024-01-01")), date("2024-01-01"));
        assert_eq!(monday_of(date("2024-01-03")), date("2024-01-01"));
        assert_eq!(monday_of(date("2024-01-07")), date("2024-01-01"));
        assert_eq!(monday_of(date("2024-01-08")), date("2024-01-08"));
    }

    #[test]
    fn checked_monday_of_rejects_weeks_past_the_calendar() {
        assert_eq!(checked_monday_of(date("2024-01-07")), Some(date("2024-01-01")));
        assert_eq!(checked_monday_of(date("+262142-12-31")), None);
    }

    #[test]
    fn add_days_crosses_month_and_year() {
        assert_eq!(add_days(date("2023-12-30"), 3), date("2024-01-02"));
        assert_eq!(add_days(date("2024-03-01"), -1), date("2024-02-29"));
        assert_eq!(monday_of(date("2025-01-01")), date("2024-12-30"));
    }

    #[test]
    fn week_helpers() {
        let monday = date("2024-01-29");
        let dates: Vec<_> = week_dates(monday).collect();
        assert_eq!(dates.len(), 7);
        assert_eq!(dates[6], date("2024-02-04"));
        assert_eq!(week_range_label(monday), "Jan 29 – Feb 4");
        assert_eq!(weekday_name(monday), "Monday");
        assert_eq!(date_header(monday), "Monday, January 29, 2024");
    }

    #[test]
    fn manual_clock_advances() {
        let start = date("2024-01-01").and_hms_opt(9, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now(), date("2024-01-01").and_hms_opt(9, 1, 30).unwrap());
    }
}
