use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::model::{NewTransactionDB, TransactionChangesDB, TransactionDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{not_found_as, StorageError};
use crate::schema::transactions;
use crate::utils::{decimal_text, parse_decimal};
use spendwatch_core::transactions::{
    NewTransaction, Transaction, TransactionRepositoryTrait, TransactionUpdate,
};
use spendwatch_core::Result;

pub struct TransactionRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl TransactionRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn to_domain(rows: Vec<TransactionDB>) -> Result<Vec<Transaction>> {
    rows.into_iter()
        .map(|row| Transaction::try_from(row).map_err(Into::into))
        .collect()
}

#[async_trait]
impl TransactionRepositoryTrait for TransactionRepository {
    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        let mut conn = get_connection(&self.pool)?;
        let row = transactions::table
            .find(transaction_id)
            .select(TransactionDB::as_select())
            .first(&mut conn)
            .map_err(not_found_as("transaction", transaction_id))?;
        Ok(Transaction::try_from(row)?)
    }

    fn find_by_owner_id(&self, owner_id: &str) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = transactions::table
            .filter(transactions::owner_id.eq(owner_id))
            .order((transactions::date.asc(), transactions::created_at.asc()))
            .select(TransactionDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        to_domain(rows)
    }

    fn sum_by_owner_category_date_range(
        &self,
        owner_id: &str,
        category_id: Option<&str>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Decimal> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = transactions::table
            .filter(transactions::owner_id.eq(owner_id))
            .filter(transactions::date.ge(start))
            .filter(transactions::date.le(end))
            .select(transactions::amount)
            .into_boxed();
        if let Some(category_id) = category_id {
            query = query.filter(transactions::category_id.eq(category_id));
        }

        // Summed in Rust: SQLite's SUM over TEXT would go through REAL.
        let amounts: Vec<String> = query.load(&mut conn).map_err(StorageError::from)?;
        let mut total = Decimal::ZERO;
        for amount in &amounts {
            total += parse_decimal("amount", amount)?;
        }
        Ok(total)
    }

    async fn insert_transaction(&self, new_transaction: NewTransaction) -> Result<Transaction> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Transaction> {
                let id = new_transaction
                    .id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                let row = NewTransactionDB::from_domain(
                    new_transaction,
                    id,
                    Uuid::new_v4().to_string(),
                    Utc::now().naive_utc(),
                );

                let created = diesel::insert_into(transactions::table)
                    .values(&row)
                    .returning(TransactionDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(Transaction::try_from(created)?)
            })
            .await
    }

    async fn update_transaction(&self, update: TransactionUpdate) -> Result<Transaction> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Transaction> {
                let changes = TransactionChangesDB {
                    category_id: update.category_id,
                    date: update.date,
                    amount: decimal_text(update.amount),
                    currency: update.currency,
                    description: update.description,
                    revision: Uuid::new_v4().to_string(),
                    updated_at: Utc::now().naive_utc(),
                };
                let updated = diesel::update(transactions::table.find(&update.id))
                    .set(&changes)
                    .returning(TransactionDB::as_returning())
                    .get_result(conn)
                    .map_err(not_found_as("transaction", &update.id))?;
                Ok(Transaction::try_from(updated)?)
            })
            .await
    }

    async fn delete_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        let transaction_id = transaction_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Transaction> {
                let removed = diesel::delete(transactions::table.find(&transaction_id))
                    .returning(TransactionDB::as_returning())
                    .get_result(conn)
                    .map_err(not_found_as("transaction", &transaction_id))?;
                Ok(Transaction::try_from(removed)?)
            })
            .await
    }
}
