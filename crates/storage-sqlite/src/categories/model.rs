//! Database models for categories.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::errors::StorageError;
use crate::utils::parse_enum;
use spendwatch_core::categories::{Category, NewCategory};

#[derive(Queryable, Identifiable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::categories)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CategoryDB {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub category_type: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::categories)]
pub struct NewCategoryDB {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub category_type: String,
    pub created_at: NaiveDateTime,
}

impl TryFrom<CategoryDB> for Category {
    type Error = StorageError;

    fn try_from(db: CategoryDB) -> Result<Self, Self::Error> {
        Ok(Self {
            id: db.id,
            owner_id: db.owner_id,
            name: db.name,
            category_type: parse_enum("category_type", &db.category_type)?,
        })
    }
}

impl NewCategoryDB {
    pub fn from_domain(domain: NewCategory, id: String, now: NaiveDateTime) -> Self {
        Self {
            id,
            owner_id: domain.owner_id,
            name: domain.name,
            category_type: domain.category_type.as_str().to_string(),
            created_at: now,
        }
    }
}
