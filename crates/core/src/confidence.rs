//! Confidence scorer.
//!
//! A person's confidence score is their calendar availability percentage
//! scaled by a leave-status multiplier, rounded to one decimal place. The
//! score is always recomputed from the current stored calendar percentage;
//! it is never incrementally adjusted.

use coverageiq_domain::LeaveStatus;

/// Rounds to one decimal place, matching the precision of every
/// percentage the engine reports.
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Computes the confidence score for a calendar percentage under a
/// leave status.
pub fn confidence(calendar_pct: f64, leave_status: LeaveStatus) -> f64 {
    round1(calendar_pct * leave_status.confidence_multiplier())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ooo_zeroes_the_score_regardless_of_calendar() {
        assert_eq!(confidence(100.0, LeaveStatus::Ooo), 0.0);
        assert_eq!(confidence(37.5, LeaveStatus::Ooo), 0.0);
    }

    #[test]
    fn available_passes_the_calendar_percentage_through() {
        assert_eq!(confidence(100.0, LeaveStatus::Available), 100.0);
        assert_eq!(confidence(77.8, LeaveStatus::Available), 77.8);
    }

    #[test]
    fn partial_halves_the_calendar_percentage() {
        assert_eq!(confidence(80.0, LeaveStatus::Partial), 40.0);
        assert_eq!(confidence(77.8, LeaveStatus::Partial), 38.9);
    }

    #[test]
    fn result_is_rounded_to_one_decimal() {
        assert_eq!(confidence(33.33, LeaveStatus::Available), 33.3);
        assert_eq!(confidence(33.35, LeaveStatus::Partial), 16.7);
    }
}
