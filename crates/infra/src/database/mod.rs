//! SQLite persistence for the person roster.

mod manager;
mod person_repository;

pub use manager::DbManager;
pub use person_repository::SqlitePersonRepository;
