//! Database models for budgets.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

use crate::errors::StorageError;
use crate::utils::{decimal_text, parse_decimal, parse_enum};
use spendwatch_core::budgets::{Budget, BudgetCategory, BudgetStatus, NewBudget};

#[derive(Queryable, Identifiable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::budgets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BudgetDB {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::budgets)]
pub struct NewBudgetDB {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::budget_categories)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BudgetCategoryDB {
    pub id: String,
    pub budget_id: String,
    pub category_id: String,
    pub limit_amount: String,
    pub spent_amount: String,
}

/// An applied spend event key.
#[derive(Queryable, Insertable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::spend_events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SpendEventDB {
    pub event_key: String,
    pub recorded_at: NaiveDateTime,
}

impl TryFrom<BudgetDB> for Budget {
    type Error = StorageError;

    fn try_from(db: BudgetDB) -> Result<Self, Self::Error> {
        Ok(Self {
            status: parse_enum("status", &db.status)?,
            id: db.id,
            owner_id: db.owner_id,
            name: db.name,
            start_date: db.start_date,
            end_date: db.end_date,
        })
    }
}

impl TryFrom<BudgetCategoryDB> for BudgetCategory {
    type Error = StorageError;

    fn try_from(db: BudgetCategoryDB) -> Result<Self, Self::Error> {
        Ok(Self {
            limit_amount: parse_decimal("limit_amount", &db.limit_amount)?,
            spent_amount: parse_decimal("spent_amount", &db.spent_amount)?,
            id: db.id,
            budget_id: db.budget_id,
            category_id: db.category_id,
        })
    }
}

impl From<&BudgetCategory> for BudgetCategoryDB {
    fn from(domain: &BudgetCategory) -> Self {
        Self {
            id: domain.id.clone(),
            budget_id: domain.budget_id.clone(),
            category_id: domain.category_id.clone(),
            limit_amount: decimal_text(domain.limit_amount),
            spent_amount: decimal_text(domain.spent_amount),
        }
    }
}

impl NewBudgetDB {
    pub fn from_domain(
        domain: &NewBudget,
        id: String,
        status: BudgetStatus,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            owner_id: domain.owner_id.clone(),
            name: domain.name.clone(),
            start_date: domain.start_date,
            end_date: domain.end_date,
            status: status.as_str().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}
