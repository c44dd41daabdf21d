//! Database models for rules.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::errors::StorageError;
use crate::utils::{decimal_text, parse_decimal, parse_enum};
use spendwatch_core::rules::{NewRule, Rule};

#[derive(Queryable, Identifiable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::rules)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RuleDB {
    pub id: String,
    pub owner_id: String,
    pub category_id: Option<String>,
    pub condition_type: String,
    pub threshold: String,
    pub period: String,
    pub active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::rules)]
pub struct NewRuleDB {
    pub id: String,
    pub owner_id: String,
    pub category_id: Option<String>,
    pub condition_type: String,
    pub threshold: String,
    pub period: String,
    pub active: bool,
    pub created_at: NaiveDateTime,
}

impl TryFrom<RuleDB> for Rule {
    type Error = StorageError;

    fn try_from(db: RuleDB) -> Result<Self, Self::Error> {
        Ok(Self {
            condition_type: parse_enum("condition_type", &db.condition_type)?,
            threshold: parse_decimal("threshold", &db.threshold)?,
            period: parse_enum("period", &db.period)?,
            id: db.id,
            owner_id: db.owner_id,
            category_id: db.category_id,
            active: db.active,
        })
    }
}

impl NewRuleDB {
    pub fn from_domain(domain: NewRule, id: String, now: NaiveDateTime) -> Self {
        Self {
            id,
            owner_id: domain.owner_id,
            category_id: domain.category_id,
            condition_type: domain.condition_type.as_str().to_string(),
            threshold: decimal_text(domain.threshold),
            period: domain.period.as_str().to_string(),
            active: domain.active,
            created_at: now,
        }
    }
}
