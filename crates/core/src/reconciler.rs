//! OOO reconciler.
//!
//! Applies detected time-off candidates to the roster, runs the periodic
//! activation/restoration pass, and owns the manual override operations.
//! Every state change goes through a single atomic `save_person`, so a
//! person is never observed with a schedule but a stale status from the
//! same write.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use coverageiq_domain::{
    CoverageError, LeaveStatus, OooChange, Person, Result, RosterSummary, SkipReason,
    SkippedCandidate, TickOutcome, TimeOffCandidate, TimeOffSyncResult,
};
use tracing::{debug, info, warn};

use crate::confidence::confidence;
use crate::dates::parse_flexible;
use crate::matcher::{NameResolutionCache, TimeOffMatcher};
use crate::ports::PersonRepository;

pub struct OooReconciler {
    persons: Arc<dyn PersonRepository>,
    matcher: TimeOffMatcher,
    cache: Mutex<NameResolutionCache>,
}

impl OooReconciler {
    pub fn new(persons: Arc<dyn PersonRepository>) -> Self {
        Self {
            persons,
            matcher: TimeOffMatcher::default(),
            cache: Mutex::new(NameResolutionCache::new()),
        }
    }

    pub fn with_matcher(mut self, matcher: TimeOffMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    fn resolve(&self, reference: &str, roster: &[Person]) -> Result<Option<Person>> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| CoverageError::Internal("matcher cache lock poisoned".into()))?;
        Ok(self.matcher.resolve(reference, roster, &mut cache).cloned())
    }

    /// Applies a batch of detected time-off candidates.
    ///
    /// Each candidate is validated, matched, and written independently;
    /// a skip or store conflict never aborts the rest of the batch. The
    /// returned result accounts for every candidate.
    pub async fn apply_candidates(
        &self,
        candidates: &[TimeOffCandidate],
    ) -> Result<TimeOffSyncResult> {
        let now = Utc::now();
        let today = now.date_naive();
        let roster = self.persons.list_persons().await?;

        let mut result = TimeOffSyncResult {
            detected: candidates.len(),
            ..Default::default()
        };
        let mut updated_in_batch: HashSet<String> = HashSet::new();

        for candidate in candidates {
            // Missing or unparseable start dates mean "from now".
            let start = match candidate.start_date.as_deref() {
                Some(raw) => match parse_flexible(raw) {
                    Ok(dt) => dt,
                    Err(err) => {
                        debug!(%err, "start date defaulted to now");
                        now
                    }
                },
                None => now,
            };
            // Unparseable end dates make the window open-ended.
            let until = candidate.end_date.as_deref().and_then(|raw| match parse_flexible(raw) {
                Ok(dt) => Some(dt),
                Err(err) => {
                    debug!(%err, "end date treated as open-ended");
                    None
                }
            });

            // Date-only comparison: a window ending today stays live
            // for the whole of today.
            if until.is_some_and(|until| until.date_naive() < today) {
                record_skip(&mut result, &candidate.person_reference, SkipReason::Stale);
                continue;
            }

            let Some(matched) = self.resolve(&candidate.person_reference, &roster)? else {
                record_skip(&mut result, &candidate.person_reference, SkipReason::NoMatch);
                continue;
            };
            if matched.manually_overridden {
                record_skip(
                    &mut result,
                    &candidate.person_reference,
                    SkipReason::ManualOverrideActive,
                );
                continue;
            }
            if updated_in_batch.contains(&matched.id) {
                record_skip(
                    &mut result,
                    &candidate.person_reference,
                    SkipReason::DuplicateInBatch,
                );
                continue;
            }
            if same_window(&matched, start, until) {
                record_skip(
                    &mut result,
                    &candidate.person_reference,
                    SkipReason::AlreadyApplied,
                );
                continue;
            }

            // One save carries schedule, status, and confidence together.
            let mut person = matched;
            person.ooo_schedule_start = Some(start);
            person.ooo_schedule_until = until;
            let pending = start > now;
            if !pending {
                person.leave_status = LeaveStatus::Ooo;
                person.is_ooo = true;
                person.confidence_score = confidence(person.calendar_pct, LeaveStatus::Ooo);
            }
            match self.persons.save_person(&person).await {
                Ok(_) => {}
                Err(CoverageError::Conflict(msg)) => {
                    warn!(person_id = %person.id, %msg, "concurrent write, candidate skipped");
                    record_skip(
                        &mut result,
                        &candidate.person_reference,
                        SkipReason::StoreConflict,
                    );
                    continue;
                }
                Err(err) => return Err(err),
            }
            updated_in_batch.insert(person.id.clone());

            // Show the covering person's display name when they resolve.
            let coverage_display = match candidate.coverage_reference.as_deref() {
                Some(reference) => Some(
                    self.resolve(reference, &roster)?
                        .map(|p| p.name)
                        .unwrap_or_else(|| reference.to_string()),
                ),
                None => None,
            };

            info!(
                person_id = %person.id,
                person_name = %person.name,
                start = %start,
                until = ?until,
                pending,
                "time-off schedule applied"
            );
            result.changes.push(OooChange {
                person_id: person.id,
                person_name: person.name,
                matched_reference: candidate.person_reference.clone(),
                start_date: start,
                end_date: until,
                reason: candidate.reason.clone(),
                coverage_display,
                pending,
            });
            result.applied += 1;
            if pending {
                result.pending += 1;
            }
        }

        info!(
            detected = result.detected,
            applied = result.applied,
            pending = result.pending,
            skipped = result.skipped,
            "time-off batch reconciled"
        );
        Ok(result)
    }

    /// One reconciliation pass over the whole roster: restore people whose
    /// window has ended, then activate schedules whose start has arrived.
    ///
    /// Restoration is checked first so an expired schedule never flips a
    /// person to OOO and back in the same pass. Running the tick twice in
    /// a row is a no-op.
    pub async fn tick(&self) -> Result<TickOutcome> {
        let now = Utc::now();
        let today = now.date_naive();
        let mut outcome = TickOutcome::default();

        for person in self.persons.list_persons().await? {
            if person.manually_overridden {
                continue;
            }

            let window_ended = person
                .ooo_schedule_until
                .is_some_and(|until| until.date_naive() < today);
            if window_ended {
                let mut restored = person.clone();
                restored.leave_status = LeaveStatus::Available;
                restored.is_ooo = false;
                restored.ooo_schedule_start = None;
                restored.ooo_schedule_until = None;
                restored.confidence_score =
                    confidence(restored.calendar_pct, LeaveStatus::Available);
                match self.persons.save_person(&restored).await {
                    Ok(_) => {
                        info!(person_id = %restored.id, "time-off window ended, restored to available");
                        outcome.restored.push(restored.id);
                    }
                    Err(CoverageError::Conflict(msg)) => {
                        warn!(person_id = %person.id, %msg, "concurrent write, restore deferred to next tick");
                    }
                    Err(err) => return Err(err),
                }
                continue;
            }

            let due = person
                .ooo_schedule_start
                .is_some_and(|start| start <= now);
            if due && person.leave_status != LeaveStatus::Ooo {
                let mut activated = person.clone();
                activated.leave_status = LeaveStatus::Ooo;
                activated.is_ooo = true;
                activated.confidence_score =
                    confidence(activated.calendar_pct, LeaveStatus::Ooo);
                // Schedule fields stay so the restore pass can find the end.
                match self.persons.save_person(&activated).await {
                    Ok(_) => {
                        info!(person_id = %activated.id, "scheduled time-off started, switched to ooo");
                        outcome.activated.push(activated.id);
                    }
                    Err(CoverageError::Conflict(msg)) => {
                        warn!(person_id = %person.id, %msg, "concurrent write, activation deferred to next tick");
                    }
                    Err(err) => return Err(err),
                }
            }
        }

        if !outcome.is_empty() {
            info!(
                activated = outcome.activated.len(),
                restored = outcome.restored.len(),
                "reconciliation tick applied changes"
            );
        }
        Ok(outcome)
    }

    /// Pins a person's leave status against automation. Overridden people
    /// are untouched by `apply_candidates` and `tick` until the override
    /// is cleared.
    pub async fn set_override(&self, person_id: &str, status: LeaveStatus) -> Result<Person> {
        let mut person = self.fetch(person_id).await?;
        person.leave_status = status;
        person.is_ooo = status == LeaveStatus::Ooo;
        person.manually_overridden = true;
        // The override supersedes any externally sourced schedule.
        person.ooo_schedule_start = None;
        person.ooo_schedule_until = None;
        person.confidence_score = confidence(person.calendar_pct, status);
        let saved = self.persons.save_person(&person).await?;
        info!(person_id, status = %status, "manual override set");
        Ok(saved)
    }

    /// Lifts a manual override and returns the person to automated
    /// control, reset to available until the next batch or tick says
    /// otherwise.
    pub async fn clear_override(&self, person_id: &str) -> Result<Person> {
        let mut person = self.fetch(person_id).await?;
        person.manually_overridden = false;
        person.leave_status = LeaveStatus::Available;
        person.is_ooo = false;
        // Any schedule recorded alongside the override is stale; dropping
        // it keeps the next tick from resurrecting it.
        person.ooo_schedule_start = None;
        person.ooo_schedule_until = None;
        person.confidence_score = confidence(person.calendar_pct, LeaveStatus::Available);
        let saved = self.persons.save_person(&person).await?;
        info!(person_id, "manual override cleared");
        Ok(saved)
    }

    /// Roster-wide status counts.
    pub async fn summarize(&self) -> Result<RosterSummary> {
        let roster = self.persons.list_persons().await?;
        let mut summary = RosterSummary {
            ooo: 0,
            partial: 0,
            fully_available: 0,
            last_synced: Utc::now(),
        };
        let mut last_synced: Option<DateTime<Utc>> = None;
        for person in &roster {
            if person.is_ooo {
                summary.ooo += 1;
            } else if person.leave_status == LeaveStatus::Partial {
                summary.partial += 1;
            } else {
                summary.fully_available += 1;
            }
            if last_synced.map_or(true, |seen| person.last_synced > seen) {
                last_synced = Some(person.last_synced);
            }
        }
        if let Some(seen) = last_synced {
            summary.last_synced = seen;
        }
        Ok(summary)
    }

    async fn fetch(&self, person_id: &str) -> Result<Person> {
        self.persons
            .get_person(person_id)
            .await?
            .ok_or_else(|| CoverageError::NotFound(format!("person {person_id}")))
    }
}

/// Whether the stored schedule already covers the candidate's window,
/// compared date-wise so re-detected batches stay idempotent.
fn same_window(person: &Person, start: DateTime<Utc>, until: Option<DateTime<Utc>>) -> bool {
    person.ooo_schedule_start.map(|dt| dt.date_naive()) == Some(start.date_naive())
        && person.ooo_schedule_until.map(|dt| dt.date_naive())
            == until.map(|dt| dt.date_naive())
}

fn record_skip(result: &mut TimeOffSyncResult, reference: &str, reason: SkipReason) {
    debug!(reference, %reason, "time-off candidate skipped");
    result.skips.push(SkippedCandidate {
        person_reference: reference.to_string(),
        reason,
    });
    result.skipped += 1;
}
