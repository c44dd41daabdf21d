//! Scheduler module - periodic batch entry points over every user and entity.

mod scheduler_model;
mod scheduler_service;


pub use scheduler_model::{BatchReport, ScheduledJob};
pub use scheduler_service::{EvaluationScheduler, SchedulerSources};
