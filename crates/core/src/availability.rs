//! Calendar availability calculator.
//!
//! Turns a person's calendar occurrences into per-day and overall
//! availability percentages over a date range, measured against the
//! configured working window. All clock math happens in UTC; local
//! working hours are projected into UTC through the configured timezone
//! before any interval arithmetic.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use coverageiq_domain::constants::DEFAULT_EVENT_DURATION_MINUTES;
use coverageiq_domain::{
    AvailabilityReport, BlockedBlock, CalendarOccurrence, CoverageError, DayAvailability, Result,
    WeekAvailability, WorkingHoursConfig,
};
use tracing::info;

use crate::confidence::{confidence, round1};
use crate::interval::{merge, BusyInterval};
use crate::ports::PersonRepository;

/// Projects a local wall-clock time into UTC. Ambiguous local times (DST
/// fold) take the earlier reading; nonexistent ones (DST gap) fall back
/// to reading the naive value as UTC.
fn local_to_utc(naive: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive).earliest() {
        Some(dt) => dt.to_utc(),
        None => naive.and_utc(),
    }
}

/// The configured working window for `date`, as a UTC interval, or `None`
/// when the window is empty.
fn working_window(date: NaiveDate, hours: &WorkingHoursConfig, tz: Tz) -> Option<BusyInterval> {
    let start = local_to_utc(date.and_time(hours.work_start), tz);
    let end = local_to_utc(date.and_time(hours.work_end), tz);
    BusyInterval::new(start, end)
}

/// Converts calendar occurrences into busy intervals.
///
/// Transparent occurrences are dropped: they mark time the person marked
/// as free despite holding an event. All-day occurrences block exactly
/// that date's working window, not the full 24 hours. Timed occurrences
/// with no end get the default event duration.
pub fn busy_intervals(
    occurrences: &[CalendarOccurrence],
    hours: &WorkingHoursConfig,
    tz: Tz,
) -> Vec<BusyInterval> {
    let mut intervals = Vec::with_capacity(occurrences.len());
    for occurrence in occurrences {
        if occurrence.is_transparent() {
            continue;
        }
        let interval = match occurrence {
            CalendarOccurrence::AllDay { date, .. } => working_window(*date, hours, tz),
            CalendarOccurrence::Timed { start, end, .. } => {
                let end = end.unwrap_or_else(|| {
                    *start + chrono::Duration::minutes(DEFAULT_EVENT_DURATION_MINUTES)
                });
                BusyInterval::new(*start, end)
            }
        };
        if let Some(interval) = interval {
            intervals.push(interval);
        }
    }
    intervals
}

/// Computes an availability report for `[range_start, range_end)`.
///
/// Non-working days contribute nothing to either side of the ratio. A
/// range containing no working days reports 100% overall: no working
/// time was expected, so none was lost.
pub fn calculate_availability(
    busy: &[BusyInterval],
    range_start: NaiveDate,
    range_end: NaiveDate,
    hours: &WorkingHoursConfig,
    tz: Tz,
) -> AvailabilityReport {
    let mut per_day = Vec::new();
    let mut total_work_minutes = 0i64;
    let mut total_busy_minutes = 0i64;

    let mut date = range_start;
    while date < range_end {
        let next = match date.checked_add_days(Days::new(1)) {
            Some(next) => next,
            None => break,
        };
        if !hours.is_work_day(date.weekday()) {
            date = next;
            continue;
        }
        let Some(window) = working_window(date, hours, tz) else {
            date = next;
            continue;
        };

        let work_minutes = window.minutes();
        let clipped: Vec<BusyInterval> =
            busy.iter().filter_map(|iv| iv.clip(&window)).collect();
        let blocked = merge(clipped);
        let busy_minutes: i64 = blocked.iter().map(BusyInterval::minutes).sum();
        let available_minutes = work_minutes - busy_minutes;
        let availability_pct = if work_minutes > 0 {
            round1(available_minutes as f64 / work_minutes as f64 * 100.0)
        } else {
            100.0
        };

        per_day.push(DayAvailability {
            date,
            weekday: date.format("%A").to_string(),
            work_minutes,
            busy_minutes,
            available_minutes,
            availability_pct,
            blocked_blocks: blocked
                .iter()
                .map(|iv| BlockedBlock {
                    start: iv.start.with_timezone(&tz).format("%H:%M").to_string(),
                    end: iv.end.with_timezone(&tz).format("%H:%M").to_string(),
                    duration_min: iv.minutes(),
                })
                .collect(),
        });
        total_work_minutes += work_minutes;
        total_busy_minutes += busy_minutes;
        date = next;
    }

    let total_available_minutes = total_work_minutes - total_busy_minutes;
    let availability_pct = if total_work_minutes > 0 {
        round1(total_available_minutes as f64 / total_work_minutes as f64 * 100.0)
    } else {
        100.0
    };

    AvailabilityReport {
        timezone: tz.name().to_string(),
        range_start,
        range_end,
        generated_at: Utc::now(),
        total_work_minutes,
        total_busy_minutes,
        total_available_minutes,
        availability_pct,
        per_day,
    }
}

/// Folds a report into the Monday-to-Friday availability snapshot stored
/// on the person. Only weekdays present in the report are touched, so a
/// partial-week sync leaves the other days' figures intact; when the
/// range covers several weeks the last occurrence of each weekday wins.
fn merge_week_availability(week: &mut WeekAvailability, report: &AvailabilityReport) {
    for day in &report.per_day {
        match day.weekday.as_str() {
            "Monday" => week.monday = day.availability_pct,
            "Tuesday" => week.tuesday = day.availability_pct,
            "Wednesday" => week.wednesday = day.availability_pct,
            "Thursday" => week.thursday = day.availability_pct,
            "Friday" => week.friday = day.availability_pct,
            _ => {}
        }
    }
}

/// Availability service: computes reports and persists the resulting
/// calendar percentage back onto the person record.
pub struct AvailabilityService {
    persons: Arc<dyn PersonRepository>,
    hours: WorkingHoursConfig,
}

impl AvailabilityService {
    pub fn new(persons: Arc<dyn PersonRepository>, hours: WorkingHoursConfig) -> Self {
        Self { persons, hours }
    }

    fn timezone(&self) -> Result<Tz> {
        self.hours
            .timezone
            .parse()
            .map_err(|_| CoverageError::Config(format!("unknown timezone: {}", self.hours.timezone)))
    }

    /// Computes a report without touching storage.
    pub fn report(
        &self,
        occurrences: &[CalendarOccurrence],
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> Result<AvailabilityReport> {
        let tz = self.timezone()?;
        let busy = busy_intervals(occurrences, &self.hours, tz);
        Ok(calculate_availability(&busy, range_start, range_end, &self.hours, tz))
    }

    /// Recomputes a person's calendar availability from fresh occurrences
    /// and persists the outcome.
    ///
    /// A manual override freezes leave status and confidence, but the
    /// calendar percentage and weekly snapshot still track reality.
    pub async fn sync_calendar(
        &self,
        person_id: &str,
        occurrences: &[CalendarOccurrence],
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> Result<AvailabilityReport> {
        let mut person = self
            .persons
            .get_person(person_id)
            .await?
            .ok_or_else(|| CoverageError::NotFound(format!("person {person_id}")))?;

        let report = self.report(occurrences, range_start, range_end)?;
        person.calendar_pct = report.availability_pct;
        merge_week_availability(&mut person.week_availability, &report);
        person.last_synced = Utc::now();
        if !person.manually_overridden {
            person.confidence_score = confidence(person.calendar_pct, person.leave_status);
        }
        self.persons.save_person(&person).await?;

        info!(
            person_id = %person.id,
            calendar_pct = person.calendar_pct,
            confidence = person.confidence_score,
            "calendar availability synced"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hours() -> WorkingHoursConfig {
        WorkingHoursConfig::default()
    }

    fn utc() -> Tz {
        chrono_tz::UTC
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // Working week of 2026-02-23 (Monday) through 2026-02-27 (Friday).
    fn work_week() -> (NaiveDate, NaiveDate) {
        (date(2026, 2, 23), date(2026, 2, 28))
    }

    #[test]
    fn two_hour_meeting_costs_one_ninth_of_the_day() {
        let (start, end) = work_week();
        let occurrences = vec![CalendarOccurrence::timed(
            Utc.with_ymd_and_hms(2026, 2, 24, 10, 0, 0).unwrap(),
            Some(Utc.with_ymd_and_hms(2026, 2, 24, 12, 0, 0).unwrap()),
        )];
        let busy = busy_intervals(&occurrences, &hours(), utc());
        let report = calculate_availability(&busy, start, end, &hours(), utc());

        assert_eq!(report.per_day.len(), 5);
        let tuesday = &report.per_day[1];
        assert_eq!(tuesday.weekday, "Tuesday");
        assert_eq!(tuesday.busy_minutes, 120);
        assert_eq!(tuesday.availability_pct, 77.8);
        assert_eq!(tuesday.blocked_blocks.len(), 1);
        assert_eq!(tuesday.blocked_blocks[0].start, "10:00");
        assert_eq!(tuesday.blocked_blocks[0].end, "12:00");

        assert_eq!(report.per_day[0].availability_pct, 100.0);
        assert_eq!(report.total_work_minutes, 2700);
        assert_eq!(report.total_busy_minutes, 120);
        assert_eq!(report.availability_pct, 95.6);
    }

    #[test]
    fn transparent_occurrences_do_not_block_time() {
        let (start, end) = work_week();
        let occurrences = vec![CalendarOccurrence::timed(
            Utc.with_ymd_and_hms(2026, 2, 24, 10, 0, 0).unwrap(),
            Some(Utc.with_ymd_and_hms(2026, 2, 24, 12, 0, 0).unwrap()),
        )
        .transparent()];
        let busy = busy_intervals(&occurrences, &hours(), utc());
        let report = calculate_availability(&busy, start, end, &hours(), utc());
        assert_eq!(report.availability_pct, 100.0);
    }

    #[test]
    fn all_day_occurrence_blocks_the_working_window_only() {
        let (start, end) = work_week();
        let occurrences = vec![CalendarOccurrence::all_day(date(2026, 2, 25))];
        let busy = busy_intervals(&occurrences, &hours(), utc());
        assert_eq!(busy[0].minutes(), 540);

        let report = calculate_availability(&busy, start, end, &hours(), utc());
        let wednesday = &report.per_day[2];
        assert_eq!(wednesday.availability_pct, 0.0);
        assert_eq!(wednesday.busy_minutes, 540);
    }

    #[test]
    fn untimed_end_defaults_to_one_hour() {
        let occurrences = vec![CalendarOccurrence::timed(
            Utc.with_ymd_and_hms(2026, 2, 24, 10, 0, 0).unwrap(),
            None,
        )];
        let busy = busy_intervals(&occurrences, &hours(), utc());
        assert_eq!(busy[0].minutes(), 60);
    }

    #[test]
    fn overlapping_events_do_not_double_count() {
        let (start, end) = work_week();
        let occurrences = vec![
            CalendarOccurrence::timed(
                Utc.with_ymd_and_hms(2026, 2, 24, 10, 0, 0).unwrap(),
                Some(Utc.with_ymd_and_hms(2026, 2, 24, 12, 0, 0).unwrap()),
            ),
            CalendarOccurrence::timed(
                Utc.with_ymd_and_hms(2026, 2, 24, 11, 0, 0).unwrap(),
                Some(Utc.with_ymd_and_hms(2026, 2, 24, 13, 0, 0).unwrap()),
            ),
        ];
        let busy = busy_intervals(&occurrences, &hours(), utc());
        let report = calculate_availability(&busy, start, end, &hours(), utc());
        assert_eq!(report.per_day[1].busy_minutes, 180);
        assert_eq!(report.per_day[1].blocked_blocks.len(), 1);
    }

    #[test]
    fn events_outside_the_window_are_clipped() {
        let (start, end) = work_week();
        // 07:00-10:00 only overlaps the 09:00 window start by an hour.
        let occurrences = vec![CalendarOccurrence::timed(
            Utc.with_ymd_and_hms(2026, 2, 24, 7, 0, 0).unwrap(),
            Some(Utc.with_ymd_and_hms(2026, 2, 24, 10, 0, 0).unwrap()),
        )];
        let busy = busy_intervals(&occurrences, &hours(), utc());
        let report = calculate_availability(&busy, start, end, &hours(), utc());
        assert_eq!(report.per_day[1].busy_minutes, 60);
    }

    #[test]
    fn weekend_only_range_reports_full_availability() {
        let report = calculate_availability(
            &[],
            date(2026, 2, 21),
            date(2026, 2, 23),
            &hours(),
            utc(),
        );
        assert!(report.per_day.is_empty());
        assert_eq!(report.total_work_minutes, 0);
        assert_eq!(report.availability_pct, 100.0);
    }

    #[test]
    fn weekend_events_cost_nothing() {
        let (start, _) = work_week();
        // Saturday 2026-02-21 all day.
        let occurrences = vec![CalendarOccurrence::all_day(date(2026, 2, 21))];
        let busy = busy_intervals(&occurrences, &hours(), utc());
        let report =
            calculate_availability(&busy, date(2026, 2, 21), start, &hours(), utc());
        assert_eq!(report.availability_pct, 100.0);
    }

    #[test]
    fn week_snapshot_tracks_per_day_percentages() {
        let (start, end) = work_week();
        let occurrences = vec![CalendarOccurrence::all_day(date(2026, 2, 25))];
        let busy = busy_intervals(&occurrences, &hours(), utc());
        let report = calculate_availability(&busy, start, end, &hours(), utc());
        let mut week = WeekAvailability::default();
        merge_week_availability(&mut week, &report);
        assert_eq!(week.monday, 100.0);
        assert_eq!(week.wednesday, 0.0);
        assert_eq!(week.friday, 100.0);
    }

    #[test]
    fn partial_week_merge_leaves_other_days_untouched() {
        // Tuesday-only report.
        let report = calculate_availability(
            &[],
            date(2026, 2, 24),
            date(2026, 2, 25),
            &hours(),
            utc(),
        );
        let mut week = WeekAvailability {
            monday: 55.5,
            tuesday: 0.0,
            wednesday: 80.0,
            thursday: 80.0,
            friday: 80.0,
        };
        merge_week_availability(&mut week, &report);
        assert_eq!(week.tuesday, 100.0);
        assert_eq!(week.monday, 55.5);
        assert_eq!(week.friday, 80.0);
    }

    #[test]
    fn working_hours_follow_the_local_timezone() {
        let tz: Tz = "America/New_York".parse().unwrap();
        let occurrences = vec![CalendarOccurrence::timed(
            // 14:00 UTC is 09:00 in New York on this date.
            Utc.with_ymd_and_hms(2026, 2, 24, 14, 0, 0).unwrap(),
            Some(Utc.with_ymd_and_hms(2026, 2, 24, 16, 0, 0).unwrap()),
        )];
        let busy = busy_intervals(&occurrences, &hours(), tz);
        let report =
            calculate_availability(&busy, date(2026, 2, 24), date(2026, 2, 25), &hours(), tz);
        assert_eq!(report.per_day[0].busy_minutes, 120);
        assert_eq!(report.per_day[0].blocked_blocks[0].start, "09:00");
    }
}
