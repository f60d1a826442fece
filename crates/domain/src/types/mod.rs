//! Domain types and models

pub mod calendar;
pub mod person;
pub mod timeoff;

pub use calendar::{AvailabilityReport, BlockedBlock, CalendarOccurrence, DayAvailability};
pub use person::{LeaveStatus, Person, RosterSummary, WeekAvailability};
pub use timeoff::{
    OooChange, SkipReason, SkippedCandidate, TickOutcome, TimeOffCandidate, TimeOffSyncResult,
};
