//! Transactions module - ledger models, repository trait and the ingestion
//! service that keeps derived state in step with ledger mutations.

mod transactions_model;
mod transactions_service;
mod transactions_traits;


pub use transactions_model::{NewTransaction, Transaction, TransactionUpdate};
pub use transactions_service::TransactionService;
pub use transactions_traits::{TransactionRepositoryTrait, TransactionServiceTrait};
