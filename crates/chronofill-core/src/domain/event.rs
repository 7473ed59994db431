//! Day plans and the commit events they expand into.

use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Number of events scheduled for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPlan {
    /// The calendar day being planned.
    pub date: NaiveDate,

    /// Zero-based position of the day within the walked range.
    pub day_index: u32,

    /// Events to generate for this day, drawn once.
    pub commit_count: u32,
}

/// One synthetic commit, pinned to a timestamp inside its originating day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitEvent {
    /// Timestamp with the offset of the scheduling timezone.
    pub timestamp: DateTime<FixedOffset>,

    /// `YYYY-MM-DD HH:MM:SS` rendering of `timestamp` in its own offset.
    pub sequence_label: String,

    /// Zero-based position of the originating day.
    pub day_index: u32,

    /// One-based position of this event within its day.
    pub sequence: u32,
}

impl CommitEvent {
    pub fn new(timestamp: DateTime<FixedOffset>, day_index: u32, sequence: u32) -> Self {
        Self {
            sequence_label: timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            timestamp,
            day_index,
            sequence,
        }
    }

    /// RFC 3339 with the scheduling offset, e.g. `2025-09-27T14:03:09+02:00`.
    pub fn local_rfc3339(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// RFC 3339 in UTC, e.g. `2025-09-27T12:03:09Z`.
    pub fn utc_rfc3339(&self) -> String {
        self.timestamp
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// The calendar day this event belongs to.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}
