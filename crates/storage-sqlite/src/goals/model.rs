//! Database models for goals.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

use crate::errors::StorageError;
use crate::utils::{decimal_text, parse_decimal};
use spendwatch_core::goals::{Goal, NewGoal};

/// Database model for goals
#[derive(Queryable, Identifiable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::goals)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GoalDB {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub category_id: Option<String>,
    pub target_amount: String,
    pub current_amount: String,
    pub target_date: NaiveDate,
    pub currency: String,
    pub completed: bool,
    pub created_at: NaiveDateTime,
}

/// Database model for creating a new goal
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::goals)]
pub struct NewGoalDB {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub category_id: Option<String>,
    pub target_amount: String,
    pub current_amount: String,
    pub target_date: NaiveDate,
    pub currency: String,
    pub completed: bool,
    pub created_at: NaiveDateTime,
}

impl TryFrom<GoalDB> for Goal {
    type Error = StorageError;

    fn try_from(db: GoalDB) -> Result<Self, Self::Error> {
        Ok(Self {
            target_amount: parse_decimal("target_amount", &db.target_amount)?,
            current_amount: parse_decimal("current_amount", &db.current_amount)?,
            id: db.id,
            owner_id: db.owner_id,
            name: db.name,
            category_id: db.category_id,
            target_date: db.target_date,
            currency: db.currency,
            completed: db.completed,
        })
    }
}

impl NewGoalDB {
    pub fn from_domain(domain: NewGoal, id: String, now: NaiveDateTime) -> Self {
        Self {
            id,
            owner_id: domain.owner_id,
            name: domain.name,
            category_id: domain.category_id,
            target_amount: decimal_text(domain.target_amount),
            current_amount: "0".to_string(),
            target_date: domain.target_date,
            currency: domain.currency,
            completed: false,
            created_at: now,
        }
    }
}
