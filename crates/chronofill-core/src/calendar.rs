//! Inclusive walks over calendar days.

use chrono::{Days, NaiveDate};

/// Inclusive range of calendar days.
///
/// An inverted range (`end` before `start`) is empty rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

/// Walk every day from `start` to `end`, both inclusive.
pub fn walk(start: NaiveDate, end: NaiveDate) -> DateRange {
    DateRange::new(start, end)
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days in the range.
    pub fn len(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            (self.end - self.start).num_days() as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the days in increasing order.
    pub fn days(&self) -> DaysIter {
        DaysIter {
            next: (self.start <= self.end).then_some(self.start),
            end: self.end,
        }
    }
}

impl IntoIterator for DateRange {
    type Item = NaiveDate;
    type IntoIter = DaysIter;

    fn into_iter(self) -> DaysIter {
        self.days()
    }
}

/// Iterator over the days of a [`DateRange`].
#[derive(Debug, Clone)]
pub struct DaysIter {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for DaysIter {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        self.next = current
            .checked_add_days(Days::new(1))
            .filter(|d| *d <= self.end);
        Some(current)
    }
}
