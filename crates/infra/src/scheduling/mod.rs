//! Background scheduling for periodic reconciliation.

mod error;
mod reconciler_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use reconciler_scheduler::{ReconcilerScheduler, SchedulerConfig};
