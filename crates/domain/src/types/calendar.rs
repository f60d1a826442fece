//! Calendar input contract and availability report types
//!
//! Occurrences arrive already expanded to concrete instants (recurrence
//! expansion is an upstream concern). The report is ephemeral: the caller
//! decides whether to persist its numbers onto the person record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One expanded calendar occurrence.
///
/// Wire shape follows the upstream contract: either `{allDay: true, date}`
/// or `{start, end, transparent}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CalendarOccurrence {
    AllDay {
        #[serde(rename = "allDay")]
        all_day: bool,
        date: NaiveDate,
        #[serde(default)]
        transparent: bool,
    },
    Timed {
        start: DateTime<Utc>,
        #[serde(default)]
        end: Option<DateTime<Utc>>,
        #[serde(default)]
        transparent: bool,
    },
}

impl CalendarOccurrence {
    pub fn all_day(date: NaiveDate) -> Self {
        Self::AllDay { all_day: true, date, transparent: false }
    }

    pub fn timed(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        Self::Timed { start, end, transparent: false }
    }

    /// Mark the occurrence as non-blocking (tentative/reminder).
    pub fn transparent(mut self) -> Self {
        match &mut self {
            Self::AllDay { transparent, .. } | Self::Timed { transparent, .. } => {
                *transparent = true;
            }
        }
        self
    }

    pub fn is_transparent(&self) -> bool {
        match self {
            Self::AllDay { transparent, .. } | Self::Timed { transparent, .. } => *transparent,
        }
    }
}

/// One merged busy block inside a day's working window, formatted in the
/// report timezone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedBlock {
    /// "HH:MM" local time.
    pub start: String,
    pub end: String,
    pub duration_min: i64,
}

/// Availability breakdown for a single working day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAvailability {
    pub date: NaiveDate,
    /// Full weekday name, e.g. "Tuesday".
    pub weekday: String,
    pub work_minutes: i64,
    pub busy_minutes: i64,
    pub available_minutes: i64,
    pub availability_pct: f64,
    pub blocked_blocks: Vec<BlockedBlock>,
}

/// Per-day detail plus overall percentage for a queried date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityReport {
    pub timezone: String,
    /// First day of the range, inclusive.
    pub range_start: NaiveDate,
    /// Last day of the range, exclusive.
    pub range_end: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub total_work_minutes: i64,
    pub total_busy_minutes: i64,
    pub total_available_minutes: i64,
    pub availability_pct: f64,
    pub per_day: Vec<DayAvailability>,
}
