//! Configuration management

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_TICK_INTERVAL_SECS, DEFAULT_TIMEZONE, DEFAULT_WORK_DAYS};

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub database: DatabaseConfig,
    pub working_hours: WorkingHoursConfig,
    pub reconciler: ReconcilerConfig,
    pub matcher: MatcherConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "coverageiq.db".to_string(), pool_size: 8 }
    }
}

/// Working-hours definition availability is measured against.
///
/// Defaults to 09:00-18:00 Monday-Friday. `work_days` holds day indexes
/// counted from Monday = 0, matching the persisted representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkingHoursConfig {
    pub work_start: NaiveTime,
    pub work_end: NaiveTime,
    pub work_days: Vec<u8>,
    /// IANA timezone name the working window is anchored in.
    pub timezone: String,
}

impl Default for WorkingHoursConfig {
    fn default() -> Self {
        Self {
            work_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            work_end: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN),
            work_days: DEFAULT_WORK_DAYS.to_vec(),
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

impl WorkingHoursConfig {
    /// Whether the given weekday is part of the configured working week.
    pub fn is_work_day(&self, weekday: Weekday) -> bool {
        let idx = weekday.num_days_from_monday() as u8;
        self.work_days.contains(&idx)
    }
}

/// Reconciliation tick configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    pub tick_interval_seconds: u64,
    /// Run one reconciliation pass immediately at scheduler start.
    pub tick_at_start: bool,
    pub enabled: bool,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self { tick_interval_seconds: DEFAULT_TICK_INTERVAL_SECS, tick_at_start: true, enabled: true }
    }
}

/// Time-off matcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Minimum name-similarity ratio accepted by the fuzzy match.
    pub similarity_threshold: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self { similarity_threshold: crate::constants::FUZZY_MATCH_THRESHOLD }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_is_nine_to_six_weekdays() {
        let hours = WorkingHoursConfig::default();
        assert_eq!(hours.work_start, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(hours.work_end, NaiveTime::from_hms_opt(18, 0, 0).unwrap());
        assert!(hours.is_work_day(Weekday::Mon));
        assert!(hours.is_work_day(Weekday::Fri));
        assert!(!hours.is_work_day(Weekday::Sat));
        assert!(!hours.is_work_day(Weekday::Sun));
    }

    #[test]
    fn config_roundtrips_through_serde() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.database.pool_size, config.database.pool_size);
        assert_eq!(back.working_hours.work_days, config.working_hours.work_days);
    }
}
