//! Spendwatch Core - Domain entities, services, and traits.
//!
//! This crate contains the spend aggregation, threshold rule, budget lifecycle
//! and goal tracking engine. It is database-agnostic and defines traits that
//! are implemented by the `storage-sqlite` crate.

pub mod alerts;
pub mod budgets;
pub mod categories;
pub mod constants;
pub mod errors;
pub mod events;
pub mod goals;
pub mod rules;
pub mod scheduler;
pub mod settings;
pub mod spending;
pub mod transactions;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
