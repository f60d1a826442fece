//! # CoverageIQ Infrastructure
//!
//! Adapters behind the core ports: the SQLite person store, the periodic
//! reconciliation scheduler, and configuration loading.

pub mod config;
pub mod database;
pub mod scheduling;

pub use database::{DbManager, SqlitePersonRepository};
pub use scheduling::{ReconcilerScheduler, SchedulerConfig, SchedulerError};
