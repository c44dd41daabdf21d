use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;
use uuid::Uuid;

use super::model::AlertDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{not_found_as, StorageError};
use crate::schema::alerts;
use spendwatch_core::alerts::{Alert, AlertRepositoryTrait, AlertSourceType, NewAlert};
use spendwatch_core::{Error, Result};

pub struct AlertRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl AlertRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn to_domain(rows: Vec<AlertDB>) -> Result<Vec<Alert>> {
    rows.into_iter()
        .map(|row| Alert::try_from(row).map_err(Into::into))
        .collect()
}

#[async_trait]
impl AlertRepositoryTrait for AlertRepository {
    fn get_alert(&self, alert_id: &str) -> Result<Alert> {
        let mut conn = get_connection(&self.pool)?;
        let row = alerts::table
            .find(alert_id)
            .select(AlertDB::as_select())
            .first(&mut conn)
            .map_err(not_found_as("alert", alert_id))?;
        Ok(Alert::try_from(row)?)
    }

    fn list_alerts(&self, owner_id: &str, unread_only: bool) -> Result<Vec<Alert>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = alerts::table
            .filter(alerts::owner_id.eq(owner_id))
            .order((alerts::created_at.asc(), alerts::id.asc()))
            .select(AlertDB::as_select())
            .into_boxed();
        if unread_only {
            query = query.filter(alerts::is_read.eq(false));
        }
        let rows = query.load(&mut conn).map_err(StorageError::from)?;
        to_domain(rows)
    }

    fn find_unread_by_source(
        &self,
        source_type: AlertSourceType,
        source_id: &str,
    ) -> Result<Vec<Alert>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = alerts::table
            .filter(alerts::source_type.eq(source_type.as_str()))
            .filter(alerts::source_id.eq(source_id))
            .filter(alerts::is_read.eq(false))
            .select(AlertDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        to_domain(rows)
    }

    async fn insert_alert(&self, new_alert: NewAlert) -> Result<Alert> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Alert> {
                let row = AlertDB::from_new(
                    new_alert,
                    Uuid::new_v4().to_string(),
                    Utc::now().naive_utc(),
                );
                let created = diesel::insert_into(alerts::table)
                    .values(&row)
                    .returning(AlertDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(Alert::try_from(created)?)
            })
            .await
    }

    async fn mark_read(&self, alert_id: &str) -> Result<Alert> {
        let alert_id = alert_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Alert> {
                let updated = diesel::update(alerts::table.find(&alert_id))
                    .set(alerts::is_read.eq(true))
                    .returning(AlertDB::as_returning())
                    .get_result(conn)
                    .map_err(not_found_as("alert", &alert_id))?;
                Ok(Alert::try_from(updated)?)
            })
            .await
    }

    async fn delete_alert(&self, alert_id: &str) -> Result<()> {
        let alert_id = alert_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let deleted = diesel::delete(alerts::table.find(&alert_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if deleted == 0 {
                    return Err(Error::not_found("alert", &alert_id));
                }
                Ok(())
            })
            .await
    }
}
