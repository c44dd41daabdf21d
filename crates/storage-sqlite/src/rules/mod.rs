//! SQLite storage implementation for spending rules.

mod model;
mod repository;

pub use model::{NewRuleDB, RuleDB};
pub use repository::RuleRepository;
