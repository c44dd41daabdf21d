//! SQLite storage implementation for budgets and their category limits.

mod model;
mod repository;

pub use model::{BudgetCategoryDB, BudgetDB, NewBudgetDB, SpendEventDB};
pub use repository::BudgetRepository;
