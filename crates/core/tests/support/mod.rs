//! Shared test doubles for core integration tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use coverageiq_core::ports::PersonRepository;
use coverageiq_domain::{CoverageError, Person, Result};

/// In-memory `PersonRepository` with the same revision compare-and-swap
/// semantics as the SQLite adapter.
#[derive(Default)]
pub struct MockPersonRepository {
    persons: Mutex<HashMap<String, Person>>,
}

impl MockPersonRepository {
    pub fn new(seed: Vec<Person>) -> Self {
        let persons = seed.into_iter().map(|p| (p.id.clone(), p)).collect();
        Self {
            persons: Mutex::new(persons),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Person>>> {
        self.persons
            .lock()
            .map_err(|_| CoverageError::Internal("mock store lock poisoned".into()))
    }

    /// Mutates a stored person directly, bypassing the CAS. Used to set
    /// up scenarios and to simulate a concurrent writer.
    pub fn mutate(&self, id: &str, f: impl FnOnce(&mut Person)) {
        let mut persons = self.persons.lock().unwrap();
        if let Some(person) = persons.get_mut(id) {
            f(person);
        }
    }
}

#[async_trait]
impl PersonRepository for MockPersonRepository {
    async fn get_person(&self, id: &str) -> Result<Option<Person>> {
        Ok(self.lock()?.get(id).cloned())
    }

    async fn list_persons(&self) -> Result<Vec<Person>> {
        let mut roster: Vec<Person> = self.lock()?.values().cloned().collect();
        roster.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(roster)
    }

    async fn save_person(&self, person: &Person) -> Result<Person> {
        let mut persons = self.lock()?;
        if let Some(existing) = persons.get(&person.id) {
            if existing.revision != person.revision {
                return Err(CoverageError::Conflict(format!(
                    "person {} was modified concurrently",
                    person.id
                )));
            }
        }
        let mut stored = person.clone();
        stored.revision += 1;
        persons.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }
}
