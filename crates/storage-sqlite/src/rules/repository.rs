use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;
use uuid::Uuid;

use super::model::{NewRuleDB, RuleDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{not_found_as, IntoCore, StorageError};
use crate::schema::rules;
use spendwatch_core::rules::{NewRule, Rule, RuleRepositoryTrait};
use spendwatch_core::{Error, Result};

pub struct RuleRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl RuleRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    fn load_rules(&self, owner_id: &str, active_only: bool) -> Result<Vec<Rule>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = rules::table
            .filter(rules::owner_id.eq(owner_id))
            .order((rules::created_at.asc(), rules::id.asc()))
            .select(RuleDB::as_select())
            .into_boxed();
        if active_only {
            query = query.filter(rules::active.eq(true));
        }
        let rows = query.load(&mut conn).map_err(StorageError::from)?;
        rows.into_iter()
            .map(|row| Rule::try_from(row).map_err(Into::into))
            .collect()
    }
}

#[async_trait]
impl RuleRepositoryTrait for RuleRepository {
    fn get_rule(&self, rule_id: &str) -> Result<Rule> {
        let mut conn = get_connection(&self.pool)?;
        let row = rules::table
            .find(rule_id)
            .select(RuleDB::as_select())
            .first(&mut conn)
            .map_err(not_found_as("rule", rule_id))?;
        Ok(Rule::try_from(row)?)
    }

    fn list_rules_by_owner(&self, owner_id: &str) -> Result<Vec<Rule>> {
        self.load_rules(owner_id, false)
    }

    fn list_active_rules_by_owner(&self, owner_id: &str) -> Result<Vec<Rule>> {
        self.load_rules(owner_id, true)
    }

    fn list_owners_with_active_rules(&self) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;
        let owners = rules::table
            .filter(rules::active.eq(true))
            .select(rules::owner_id)
            .distinct()
            .order(rules::owner_id.asc())
            .load::<String>(&mut conn)
            .into_core()?;
        Ok(owners)
    }

    async fn insert_rule(&self, new_rule: NewRule) -> Result<Rule> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Rule> {
                let id = new_rule
                    .id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                let row = NewRuleDB::from_domain(new_rule, id, Utc::now().naive_utc());

                let created = diesel::insert_into(rules::table)
                    .values(&row)
                    .returning(RuleDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(Rule::try_from(created)?)
            })
            .await
    }

    async fn set_rule_active(&self, rule_id: &str, active: bool) -> Result<Rule> {
        let rule_id = rule_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Rule> {
                let updated = diesel::update(rules::table.find(&rule_id))
                    .set(rules::active.eq(active))
                    .returning(RuleDB::as_returning())
                    .get_result(conn)
                    .map_err(not_found_as("rule", &rule_id))?;
                Ok(Rule::try_from(updated)?)
            })
            .await
    }

    async fn delete_rule(&self, rule_id: &str) -> Result<()> {
        let rule_id = rule_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let deleted = diesel::delete(rules::table.find(&rule_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if deleted == 0 {
                    return Err(Error::not_found("rule", &rule_id));
                }
                Ok(())
            })
            .await
    }
}
