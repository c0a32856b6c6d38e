//! Time-of-day windows.
//!
//! Visits, slots, lunch breaks and working hours are all intervals within
//! a single day. They are represented as minutes since midnight so that
//! buffers and gaps are plain integer arithmetic; conversions to and from
//! [`NaiveTime`] live here.
//!
//! # Time Model
//! Half-open intervals `[start, end)` in minutes since 00:00. Two windows
//! that merely touch (`a.end == b.start`) do not overlap.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Minutes in a day.
pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// Minutes since midnight for a time of day (seconds are truncated).
#[inline]
pub fn minutes_of(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight() / 60)
}

/// Time of day for a minute offset, or `None` outside `[0, 24h)`.
pub fn time_at(minutes: i64) -> Option<NaiveTime> {
    if !(0..MINUTES_PER_DAY).contains(&minutes) {
        return None;
    }
    NaiveTime::from_num_seconds_from_midnight_opt((minutes * 60) as u32, 0)
}

/// Formats a minute offset as `HH:MM`.
pub fn format_minutes(minutes: i64) -> String {
    format!("{:02}:{:02}", minutes.div_euclid(60), minutes.rem_euclid(60))
}

/// A time-of-day interval [start, end).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    /// Interval start (minutes since midnight, inclusive).
    pub start_min: i64,
    /// Interval end (minutes since midnight, exclusive).
    pub end_min: i64,
}

impl TimeWindow {
    /// Creates a new time window.
    pub fn new(start_min: i64, end_min: i64) -> Self {
        Self { start_min, end_min }
    }

    /// Creates a window from wall-clock times.
    pub fn from_times(start: NaiveTime, end: NaiveTime) -> Self {
        Self::new(minutes_of(start), minutes_of(end))
    }

    /// Creates a window starting at `start` and lasting `duration_min`.
    pub fn starting_at(start_min: i64, duration_min: i64) -> Self {
        Self::new(start_min, start_min + duration_min)
    }

    /// Creates an hour-long window starting at `start`.
    pub fn hour_from(start: NaiveTime) -> Self {
        Self::starting_at(minutes_of(start), 60)
    }

    /// Duration of this window (minutes).
    #[inline]
    pub fn duration_min(&self) -> i64 {
        self.end_min - self.start_min
    }

    /// Whether the window has positive length.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.end_min > self.start_min
    }

    /// Whether a minute offset falls within this window.
    #[inline]
    pub fn contains(&self, minute: i64) -> bool {
        minute >= self.start_min && minute < self.end_min
    }

    /// Whether `other` lies entirely within this window.
    pub fn covers(&self, other: &Self) -> bool {
        other.start_min >= self.start_min && other.end_min <= self.end_min
    }

    /// Whether two windows overlap.
    ///
    /// Equivalent to `!(end1 <= start2 || start1 >= end2)`.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start_min < other.end_min && other.start_min < self.end_min
    }

    /// Returns this window widened by `buffer_min` on both sides.
    pub fn buffered(&self, buffer_min: i64) -> Self {
        Self::new(self.start_min - buffer_min, self.end_min + buffer_min)
    }

    /// Minutes between the end of `self` and the start of `later`.
    ///
    /// Negative when the windows overlap.
    pub fn gap_until(&self, later: &Self) -> i64 {
        later.start_min - self.end_min
    }

    /// Overlap duration with another window, if any.
    pub fn overlap_min(&self, other: &Self) -> Option<i64> {
        let start = self.start_min.max(other.start_min);
        let end = self.end_min.min(other.end_min);
        if end > start {
            Some(end - start)
        } else {
            None
        }
    }

    /// Start as a wall-clock time.
    pub fn start_time(&self) -> Option<NaiveTime> {
        time_at(self.start_min)
    }

    /// End as a wall-clock time.
    pub fn end_time(&self) -> Option<NaiveTime> {
        time_at(self.end_min)
    }

    /// `HH:MM - HH:MM` label.
    pub fn label(&self) -> String {
        format!(
            "{} - {}",
            format_minutes(self.start_min),
            format_minutes(self.end_min)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_time_window() {
        let w = TimeWindow::new(540, 630);
        assert_eq!(w.duration_min(), 90);
        assert!(w.contains(540));
        assert!(w.contains(629));
        assert!(!w.contains(630)); // exclusive end
        assert!(!w.contains(500));
    }

    #[test]
    fn test_time_window_overlap() {
        let a = TimeWindow::new(0, 100);
        let b = TimeWindow::new(50, 150);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));

        let c = TimeWindow::new(100, 200); // touching but not overlapping
        assert!(!a.overlaps(&c));
        assert_eq!(a.overlap_min(&b), Some(50));
        assert_eq!(a.overlap_min(&c), None);
    }

    #[test]
    fn test_time_conversions() {
        assert_eq!(minutes_of(t(8, 30)), 510);
        assert_eq!(time_at(510), Some(t(8, 30)));
        assert_eq!(time_at(MINUTES_PER_DAY), None);
        assert_eq!(time_at(-1), None);
        assert_eq!(format_minutes(545), "09:05");
    }

    #[test]
    fn test_from_times_and_label() {
        let w = TimeWindow::from_times(t(9, 0), t(10, 30));
        assert_eq!(w, TimeWindow::new(540, 630));
        assert_eq!(w.label(), "09:00 - 10:30");
        assert_eq!(w.start_time(), Some(t(9, 0)));
        assert_eq!(w.end_time(), Some(t(10, 30)));
    }

    #[test]
    fn test_buffered_and_gap() {
        let a = TimeWindow::from_times(t(9, 0), t(10, 30));
        let b = TimeWindow::from_times(t(10, 45), t(12, 0));
        assert_eq!(a.gap_until(&b), 15);
        assert!(!a.overlaps(&b));
        assert!(a.buffered(16).overlaps(&b));
        assert!(!a.buffered(15).overlaps(&b)); // touching
    }

    #[test]
    fn test_covers_and_validity() {
        let day = TimeWindow::from_times(t(8, 30), t(17, 0));
        assert!(day.covers(&TimeWindow::starting_at(510, 90)));
        assert!(!day.covers(&TimeWindow::starting_at(960, 90)));
        assert!(!TimeWindow::new(600, 600).is_valid());
        assert_eq!(TimeWindow::hour_from(t(12, 0)), TimeWindow::new(720, 780));
    }
}
