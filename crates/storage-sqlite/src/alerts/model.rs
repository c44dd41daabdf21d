//! Database models for alerts.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::errors::StorageError;
use crate::utils::parse_enum;
use spendwatch_core::alerts::{Alert, NewAlert};

#[derive(Queryable, Identifiable, Insertable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::alerts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AlertDB {
    pub id: String,
    pub owner_id: String,
    pub source_type: String,
    pub source_id: String,
    pub kind: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

impl AlertDB {
    pub fn from_new(new_alert: NewAlert, id: String, now: NaiveDateTime) -> Self {
        Self {
            id,
            source_type: new_alert.source_type().as_str().to_string(),
            owner_id: new_alert.owner_id,
            source_id: new_alert.source_id,
            kind: new_alert.kind.as_str().to_string(),
            message: new_alert.message,
            is_read: false,
            created_at: now,
        }
    }
}

impl TryFrom<AlertDB> for Alert {
    type Error = StorageError;

    fn try_from(db: AlertDB) -> Result<Self, Self::Error> {
        Ok(Self {
            source_type: parse_enum("source_type", &db.source_type)?,
            kind: parse_enum("kind", &db.kind)?,
            id: db.id,
            owner_id: db.owner_id,
            source_id: db.source_id,
            message: db.message,
            read: db.is_read,
            created_at: db.created_at,
        })
    }
}
