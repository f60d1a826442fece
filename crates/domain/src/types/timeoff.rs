//! Time-off candidate and reconciliation result types
//!
//! Candidates arrive from an external free-text extractor and are untrusted:
//! dates are strings, and the person reference may not resolve to anyone on
//! the roster.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured time-off record produced by the upstream extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeOffCandidate {
    /// Free-text "who" reference (display name, bare first name, or a
    /// platform identity token).
    pub person_reference: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub coverage_reference: Option<String>,
}

impl TimeOffCandidate {
    pub fn new(person_reference: impl Into<String>) -> Self {
        Self {
            person_reference: person_reference.into(),
            start_date: None,
            end_date: None,
            reason: None,
            coverage_reference: None,
        }
    }

    pub fn with_dates(
        mut self,
        start: Option<impl Into<String>>,
        end: Option<impl Into<String>>,
    ) -> Self {
        self.start_date = start.map(Into::into);
        self.end_date = end.map(Into::into);
        self
    }
}

/// Why a candidate was not applied. Skips are outcomes, never errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The window's end date is strictly before today.
    Stale,
    /// The person reference resolved to nobody on the roster.
    NoMatch,
    /// The person carries a manual override.
    ManualOverrideActive,
    /// The person was already updated earlier in this batch.
    DuplicateInBatch,
    /// The stored schedule already covers the same window.
    AlreadyApplied,
    /// A concurrent writer won; the candidate may be retried.
    StoreConflict,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stale => "stale",
            Self::NoMatch => "no_match",
            Self::ManualOverrideActive => "manual_override_active",
            Self::DuplicateInBatch => "duplicate_in_batch",
            Self::AlreadyApplied => "already_applied",
            Self::StoreConflict => "store_conflict",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-candidate skip record included in the batch summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedCandidate {
    pub person_reference: String,
    pub reason: SkipReason,
}

/// Schedule write recorded for every applied candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OooChange {
    pub person_id: String,
    pub person_name: String,
    /// The raw reference the person was matched from.
    pub matched_reference: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    pub coverage_display: Option<String>,
    /// True when the window's start was still in the future at apply time.
    pub pending: bool,
}

/// Externally visible result of applying a candidate batch.
///
/// Always complete: every candidate is accounted for in `changes` or
/// `skips`, even when everything was skipped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeOffSyncResult {
    pub detected: usize,
    pub applied: usize,
    pub pending: usize,
    pub skipped: usize,
    pub changes: Vec<OooChange>,
    pub skips: Vec<SkippedCandidate>,
}

/// Result of one reconciliation tick. Empty lists mean the pass found
/// nothing to do, which is success.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickOutcome {
    /// Person ids whose schedule start arrived and were switched to OOO.
    pub activated: Vec<String>,
    /// Person ids whose schedule ended and were restored to available.
    pub restored: Vec<String>,
}

impl TickOutcome {
    pub fn is_empty(&self) -> bool {
        self.activated.is_empty() && self.restored.is_empty()
    }
}
