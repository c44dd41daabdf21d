//! Budgets module - domain models, lifecycle service, and traits.

mod budgets_model;
mod budgets_service;
mod budgets_traits;


pub use budgets_model::{
    AttentionReason, Budget, BudgetAttention, BudgetCategory, BudgetEvaluation,
    BudgetStatus, BudgetSummary, CategoryUsage, NewBudget, NewBudgetCategory, SpentChange,
    SpentIncrement,
};
pub use budgets_service::BudgetService;
pub use budgets_traits::{BudgetRepositoryTrait, BudgetServiceTrait};
