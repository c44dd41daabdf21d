//! Database models for transactions.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

use crate::errors::StorageError;
use crate::utils::{decimal_text, parse_decimal};
use spendwatch_core::transactions::{NewTransaction, Transaction};

#[derive(Queryable, Identifiable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransactionDB {
    pub id: String,
    pub owner_id: String,
    pub category_id: Option<String>,
    pub date: NaiveDate,
    pub amount: String,
    pub currency: String,
    pub description: Option<String>,
    pub revision: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::transactions)]
pub struct NewTransactionDB {
    pub id: String,
    pub owner_id: String,
    pub category_id: Option<String>,
    pub date: NaiveDate,
    pub amount: String,
    pub currency: String,
    pub description: Option<String>,
    pub revision: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Changeset for an edit. `None` in `category_id` or `description` clears the column.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::transactions)]
#[diesel(treat_none_as_null = true)]
pub struct TransactionChangesDB {
    pub category_id: Option<String>,
    pub date: NaiveDate,
    pub amount: String,
    pub currency: String,
    pub description: Option<String>,
    pub revision: String,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<TransactionDB> for Transaction {
    type Error = StorageError;

    fn try_from(db: TransactionDB) -> Result<Self, Self::Error> {
        Ok(Self {
            amount: parse_decimal("amount", &db.amount)?,
            id: db.id,
            owner_id: db.owner_id,
            category_id: db.category_id,
            date: db.date,
            currency: db.currency,
            description: db.description,
            revision: db.revision,
        })
    }
}

impl NewTransactionDB {
    pub fn from_domain(
        domain: NewTransaction,
        id: String,
        revision: String,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            owner_id: domain.owner_id,
            category_id: domain.category_id,
            date: domain.date,
            amount: decimal_text(domain.amount),
            currency: domain.currency,
            description: domain.description,
            revision,
            created_at: now,
            updated_at: now,
        }
    }
}
