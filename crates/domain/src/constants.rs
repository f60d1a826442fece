//! Application constants
//!
//! Centralized location for domain-level constants used throughout the
//! engine.

// Working window defaults (09:00-18:00, Monday-Friday)
/// Day indexes counted from Monday = 0.
pub const DEFAULT_WORK_DAYS: [u8; 5] = [0, 1, 2, 3, 4];

// Calendar occurrence handling
pub const DEFAULT_EVENT_DURATION_MINUTES: i64 = 60;
pub const DEFAULT_TIMEZONE: &str = "UTC";

// Time-off matcher
pub const FUZZY_MATCH_THRESHOLD: f64 = 0.75;
/// Platform identity tokens look like `U` followed by at least this many
/// alphanumerics (e.g. `U08ABC123`).
pub const EXTERNAL_ID_PREFIX: char = 'U';
pub const EXTERNAL_ID_MIN_SUFFIX_LEN: usize = 6;

// Reconciler scheduling
pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 300;
