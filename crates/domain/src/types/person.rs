//! Team member types
//!
//! The persisted person record the reconciliation engine mutates. Person
//! records are created by an external onboarding process; the engine only
//! updates the availability fields.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::CoverageError;

/// Coarse-grained availability classification.
///
/// A closed enum rather than a free-form string: every boundary that ingests
/// a status string (manual override input, persisted rows) parses through
/// [`LeaveStatus::from_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    Available,
    Partial,
    Ooo,
}

impl LeaveStatus {
    /// Multiplier applied to the calendar percentage by the confidence
    /// scorer.
    pub fn confidence_multiplier(self) -> f64 {
        match self {
            Self::Available => 1.0,
            Self::Partial => 0.5,
            Self::Ooo => 0.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Partial => "partial",
            Self::Ooo => "ooo",
        }
    }
}

impl fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeaveStatus {
    type Err = CoverageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "partial" => Ok(Self::Partial),
            "ooo" => Ok(Self::Ooo),
            other => Err(CoverageError::InvalidInput(format!(
                "leave status must be one of available/partial/ooo, got {other:?}"
            ))),
        }
    }
}

/// Per-weekday availability percentages derived from the last calendar sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeekAvailability {
    pub monday: f64,
    pub tuesday: f64,
    pub wednesday: f64,
    pub thursday: f64,
    pub friday: f64,
}

/// Persisted team member record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    /// Display name, also the fuzzy-match target.
    pub name: String,
    /// Stable identifier on the messaging platform (exact-match key).
    pub external_id: Option<String>,
    /// Last computed calendar availability, 0-100.
    pub calendar_pct: f64,
    pub leave_status: LeaveStatus,
    /// Redundant with `leave_status == Ooo`, kept for fast filtering.
    pub is_ooo: bool,
    /// When set, automated reconciliation must not touch `leave_status`,
    /// `is_ooo` or `confidence_score` for this person.
    pub manually_overridden: bool,
    /// Derived 0-100 score; always recomputed by the confidence scorer,
    /// never set independently.
    pub confidence_score: f64,
    /// Externally-sourced absence window. `until = None` means open-ended.
    /// Meaningful only while `manually_overridden` is false.
    pub ooo_schedule_start: Option<DateTime<Utc>>,
    pub ooo_schedule_until: Option<DateTime<Utc>>,
    pub week_availability: WeekAvailability,
    pub last_synced: DateTime<Utc>,
    /// Optimistic-concurrency counter maintained by the store; a save with a
    /// stale revision is rejected with a conflict.
    pub revision: i64,
}

impl Person {
    /// New person in the initial state: available, not overridden, no
    /// schedule.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            external_id: None,
            calendar_pct: 100.0,
            leave_status: LeaveStatus::Available,
            is_ooo: false,
            manually_overridden: false,
            confidence_score: 100.0,
            ooo_schedule_start: None,
            ooo_schedule_until: None,
            week_availability: WeekAvailability::default(),
            last_synced: Utc::now(),
            revision: 0,
        }
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    /// First whitespace-separated token of the display name.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

/// Roster-wide counts for dashboard consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterSummary {
    pub ooo: usize,
    pub partial: usize,
    pub fully_available: usize,
    pub last_synced: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leave_status_parses_known_values_only() {
        assert_eq!("available".parse::<LeaveStatus>().unwrap(), LeaveStatus::Available);
        assert_eq!("partial".parse::<LeaveStatus>().unwrap(), LeaveStatus::Partial);
        assert_eq!("ooo".parse::<LeaveStatus>().unwrap(), LeaveStatus::Ooo);
        assert!("OOO".parse::<LeaveStatus>().is_err());
        assert!("vacation".parse::<LeaveStatus>().is_err());
    }

    #[test]
    fn new_person_starts_available_with_no_schedule() {
        let person = Person::new("tm-1", "Maya Patel");
        assert_eq!(person.leave_status, LeaveStatus::Available);
        assert!(!person.is_ooo);
        assert!(!person.manually_overridden);
        assert!(person.ooo_schedule_start.is_none());
        assert!(person.ooo_schedule_until.is_none());
        assert_eq!(person.first_name(), "Maya");
    }
}
