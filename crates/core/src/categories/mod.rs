//! Categories module - domain models and repository trait.

mod categories_model;
mod categories_traits;

pub use categories_model::{Category, CategoryType, NewCategory};
pub use categories_traits::CategoryRepositoryTrait;
