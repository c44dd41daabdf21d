use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::errors::Result;
use crate::transactions::{NewTransaction, Transaction, TransactionUpdate};

/// Trait for transaction repository operations
#[async_trait]
pub trait TransactionRepositoryTrait: Send + Sync {
    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction>;

    fn find_by_owner_id(&self, owner_id: &str) -> Result<Vec<Transaction>>;

    /// Sums amounts of the owner's transactions dated within `[start, end]`.
    /// `category_id = None` sums across every category of the owner.
    fn sum_by_owner_category_date_range(
        &self,
        owner_id: &str,
        category_id: Option<&str>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Decimal>;

    async fn insert_transaction(&self, new_transaction: NewTransaction) -> Result<Transaction>;

    async fn update_transaction(&self, update: TransactionUpdate) -> Result<Transaction>;

    /// Deletes the transaction and returns the removed row.
    async fn delete_transaction(&self, transaction_id: &str) -> Result<Transaction>;
}

/// Trait for transaction service operations
#[async_trait]
pub trait TransactionServiceTrait: Send + Sync {
    async fn create_transaction(&self, new_transaction: NewTransaction) -> Result<Transaction>;

    async fn update_transaction(
        &self,
        owner_id: &str,
        update: TransactionUpdate,
    ) -> Result<Transaction>;

    async fn delete_transaction(&self, owner_id: &str, transaction_id: &str)
        -> Result<Transaction>;
}
