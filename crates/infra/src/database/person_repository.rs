//! SQLite-backed implementation of the person repository port.
//!
//! All rusqlite calls run inside `spawn_blocking` so pool waits and disk
//! IO never stall the async runtime. Writes are guarded by an optimistic
//! revision check so concurrent writers surface as conflicts instead of
//! lost updates.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coverageiq_core::ports::PersonRepository;
use coverageiq_domain::{CoverageError, LeaveStatus, Person, Result, WeekAvailability};
use rusqlite::{params, Row};
use tokio::task;

use super::manager::{map_sql_error, DbManager};

const PERSON_COLUMNS: &str = "id, name, external_id, calendar_pct, leave_status, is_ooo, \
     manually_overridden, confidence_score, ooo_schedule_start, ooo_schedule_until, \
     monday, tuesday, wednesday, thursday, friday, last_synced, revision";

pub struct SqlitePersonRepository {
    db: Arc<DbManager>,
}

impl SqlitePersonRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

fn timestamp_to_datetime(secs: i64) -> DateTime<Utc> {
    // Out-of-range values clamp rather than fail a whole row read.
    DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn map_person_row(row: &Row<'_>) -> rusqlite::Result<Person> {
    let leave_status: String = row.get(4)?;
    let leave_status = LeaveStatus::from_str(&leave_status).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let schedule_start: Option<i64> = row.get(8)?;
    let schedule_until: Option<i64> = row.get(9)?;
    let last_synced: i64 = row.get(15)?;

    Ok(Person {
        id: row.get(0)?,
        name: row.get(1)?,
        external_id: row.get(2)?,
        calendar_pct: row.get(3)?,
        leave_status,
        is_ooo: row.get(5)?,
        manually_overridden: row.get(6)?,
        confidence_score: row.get(7)?,
        ooo_schedule_start: schedule_start.map(timestamp_to_datetime),
        ooo_schedule_until: schedule_until.map(timestamp_to_datetime),
        week_availability: WeekAvailability {
            monday: row.get(10)?,
            tuesday: row.get(11)?,
            wednesday: row.get(12)?,
            thursday: row.get(13)?,
            friday: row.get(14)?,
        },
        last_synced: timestamp_to_datetime(last_synced),
        revision: row.get(16)?,
    })
}

#[async_trait]
impl PersonRepository for SqlitePersonRepository {
    async fn get_person(&self, id: &str) -> Result<Option<Person>> {
        let db = Arc::clone(&self.db);
        let id = id.to_string();
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            let sql = format!("SELECT {PERSON_COLUMNS} FROM persons WHERE id = ?1");
            match conn.query_row(&sql, params![id], map_person_row) {
                Ok(person) => Ok(Some(person)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(map_sql_error(e)),
            }
        })
        .await
        .map_err(|e| CoverageError::Internal(format!("task join failed: {e}")))?
    }

    async fn list_persons(&self) -> Result<Vec<Person>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            let sql = format!("SELECT {PERSON_COLUMNS} FROM persons ORDER BY name");
            let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
            let rows = stmt
                .query_map([], map_person_row)
                .map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
        })
        .await
        .map_err(|e| CoverageError::Internal(format!("task join failed: {e}")))?
    }

    async fn save_person(&self, person: &Person) -> Result<Person> {
        let db = Arc::clone(&self.db);
        let person = person.clone();
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;

            // Update only when the row is still at the revision the caller
            // read; zero rows touched means either a concurrent write or a
            // person we have never stored.
            let updated = conn
                .execute(
                    "UPDATE persons SET \
                         name = ?2, external_id = ?3, calendar_pct = ?4, leave_status = ?5, \
                         is_ooo = ?6, manually_overridden = ?7, confidence_score = ?8, \
                         ooo_schedule_start = ?9, ooo_schedule_until = ?10, \
                         monday = ?11, tuesday = ?12, wednesday = ?13, thursday = ?14, \
                         friday = ?15, last_synced = ?16, revision = revision + 1 \
                     WHERE id = ?1 AND revision = ?17",
                    params![
                        person.id,
                        person.name,
                        person.external_id,
                        person.calendar_pct,
                        person.leave_status.as_str(),
                        person.is_ooo,
                        person.manually_overridden,
                        person.confidence_score,
                        person.ooo_schedule_start.map(|dt| dt.timestamp()),
                        person.ooo_schedule_until.map(|dt| dt.timestamp()),
                        person.week_availability.monday,
                        person.week_availability.tuesday,
                        person.week_availability.wednesday,
                        person.week_availability.thursday,
                        person.week_availability.friday,
                        person.last_synced.timestamp(),
                        person.revision,
                    ],
                )
                .map_err(map_sql_error)?;

            if updated == 0 {
                let exists: bool = conn
                    .query_row(
                        "SELECT EXISTS(SELECT 1 FROM persons WHERE id = ?1)",
                        params![person.id],
                        |row| row.get(0),
                    )
                    .map_err(map_sql_error)?;
                if exists {
                    return Err(CoverageError::Conflict(format!(
                        "person {} was modified concurrently",
                        person.id
                    )));
                }
                conn.execute(
                    "INSERT INTO persons (id, name, external_id, calendar_pct, leave_status, \
                         is_ooo, manually_overridden, confidence_score, ooo_schedule_start, \
                         ooo_schedule_until, monday, tuesday, wednesday, thursday, friday, \
                         last_synced, revision) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
                    params![
                        person.id,
                        person.name,
                        person.external_id,
                        person.calendar_pct,
                        person.leave_status.as_str(),
                        person.is_ooo,
                        person.manually_overridden,
                        person.confidence_score,
                        person.ooo_schedule_start.map(|dt| dt.timestamp()),
                        person.ooo_schedule_until.map(|dt| dt.timestamp()),
                        person.week_availability.monday,
                        person.week_availability.tuesday,
                        person.week_availability.wednesday,
                        person.week_availability.thursday,
                        person.week_availability.friday,
                        person.last_synced.timestamp(),
                        person.revision + 1,
                    ],
                )
                .map_err(map_sql_error)?;
            }

            let mut stored = person;
            stored.revision += 1;
            Ok(stored)
        })
        .await
        .map_err(|e| CoverageError::Internal(format!("task join failed: {e}")))?
    }
}
