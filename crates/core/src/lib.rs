//! # CoverageIQ Core
//!
//! Business logic for the availability reconciliation engine:
//! interval algebra, the calendar availability calculator, the
//! confidence scorer, the time-off matcher, and the OOO reconciler
//! state machine. Persistence is reached exclusively through the
//! [`ports::PersonRepository`] trait so adapters stay swappable.

pub mod availability;
pub mod confidence;
pub mod dates;
pub mod interval;
pub mod matcher;
pub mod ports;
pub mod reconciler;

pub use availability::{busy_intervals, calculate_availability, AvailabilityService};
pub use confidence::confidence;
pub use dates::parse_flexible;
pub use interval::{merge, BusyInterval};
pub use matcher::{NameResolutionCache, TimeOffMatcher};
pub use ports::PersonRepository;
pub use reconciler::OooReconciler;
