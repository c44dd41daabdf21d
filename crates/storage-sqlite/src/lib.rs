//! SQLite storage implementation for Spendwatch.
//!
//! This crate is the only place where Diesel is used. It implements the
//! repository traits defined in `spendwatch-core` and contains:
//! - Connection pooling and embedded migrations
//! - The single-writer actor that serializes every write in its own transaction
//! - Database model types (with Diesel derives) and their domain conversions
//!
//! ```text
//!   core (domain, services, scheduler)
//!                  │ traits
//!                  ▼
//!      storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod alerts;
pub mod budgets;
pub mod categories;
pub mod goals;
pub mod rules;
pub mod transactions;

#[cfg(test)]
pub(crate) mod testing;

pub use db::{
    create_pool, get_connection, get_db_path, init, run_migrations, spawn_writer, DbConnection,
    DbPool, WriteHandle,
};

pub use errors::{IntoCore, StorageError};

pub use alerts::AlertRepository;
pub use budgets::BudgetRepository;
pub use categories::CategoryRepository;
pub use goals::GoalRepository;
pub use rules::RuleRepository;
pub use transactions::TransactionRepository;

pub use spendwatch_core::errors::{DatabaseError, Error, Result};
