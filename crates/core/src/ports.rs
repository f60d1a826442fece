//! Port interfaces connecting the engine to its persistence adapter.

use async_trait::async_trait;
use coverageiq_domain::{Person, Result};

/// Persistence contract for the person roster.
///
/// Writes use optimistic concurrency: `save_person` compares the
/// caller's `revision` against the stored row and returns
/// [`CoverageError::Conflict`](coverageiq_domain::CoverageError::Conflict)
/// when another writer got there first. Callers re-read and retry, or
/// skip that person; a conflict never invalidates other work.
#[async_trait]
pub trait PersonRepository: Send + Sync {
    async fn get_person(&self, id: &str) -> Result<Option<Person>>;

    /// Fetches the whole roster. Ordering is not significant.
    async fn list_persons(&self) -> Result<Vec<Person>>;

    /// Persists the person atomically and returns the stored record with
    /// its new revision. Inserts when the id is not yet known.
    async fn save_person(&self, person: &Person) -> Result<Person>;
}
