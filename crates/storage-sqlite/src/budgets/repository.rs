use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::debug;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::model::{BudgetCategoryDB, BudgetDB, NewBudgetDB, SpendEventDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{not_found_as, StorageError};
use crate::schema::{budget_categories, budgets, spend_events};
use crate::utils::{chunk_for_sqlite, decimal_text};
use spendwatch_core::budgets::{
    Budget, BudgetCategory, BudgetRepositoryTrait, BudgetStatus, NewBudget, NewBudgetCategory,
    SpentChange, SpentIncrement,
};
use spendwatch_core::{Error, Result};

pub struct BudgetRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl BudgetRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn budgets_to_domain(rows: Vec<BudgetDB>) -> Result<Vec<Budget>> {
    rows.into_iter()
        .map(|row| Budget::try_from(row).map_err(Into::into))
        .collect()
}

fn categories_to_domain(rows: Vec<BudgetCategoryDB>) -> Result<Vec<BudgetCategory>> {
    rows.into_iter()
        .map(|row| BudgetCategory::try_from(row).map_err(Into::into))
        .collect()
}

fn load_budget_category(
    conn: &mut SqliteConnection,
    budget_id: &str,
    category_id: &str,
) -> Result<Option<BudgetCategory>> {
    let row = budget_categories::table
        .filter(budget_categories::budget_id.eq(budget_id))
        .filter(budget_categories::category_id.eq(category_id))
        .select(BudgetCategoryDB::as_select())
        .first(conn)
        .optional()
        .map_err(StorageError::from)?;
    Ok(row.map(BudgetCategory::try_from).transpose()?)
}

fn require_budget_category(
    conn: &mut SqliteConnection,
    budget_id: &str,
    category_id: &str,
) -> Result<BudgetCategory> {
    load_budget_category(conn, budget_id, category_id)?.ok_or_else(|| {
        Error::not_found("budget category", &format!("{}:{}", budget_id, category_id))
    })
}

fn store_spent_amount(conn: &mut SqliteConnection, row: &BudgetCategory) -> Result<()> {
    diesel::update(budget_categories::table.find(&row.id))
        .set(budget_categories::spent_amount.eq(decimal_text(row.spent_amount)))
        .execute(conn)
        .map_err(StorageError::from)?;
    Ok(())
}

#[async_trait]
impl BudgetRepositoryTrait for BudgetRepository {
    fn get_budget(&self, budget_id: &str) -> Result<Budget> {
        let mut conn = get_connection(&self.pool)?;
        let row = budgets::table
            .find(budget_id)
            .select(BudgetDB::as_select())
            .first(&mut conn)
            .map_err(not_found_as("budget", budget_id))?;
        Ok(Budget::try_from(row)?)
    }

    fn list_budgets_by_owner(&self, owner_id: &str) -> Result<Vec<Budget>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = budgets::table
            .filter(budgets::owner_id.eq(owner_id))
            .order((budgets::start_date.asc(), budgets::id.asc()))
            .select(BudgetDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        budgets_to_domain(rows)
    }

    fn list_budgets_by_status(&self, status: BudgetStatus) -> Result<Vec<Budget>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = budgets::table
            .filter(budgets::status.eq(status.as_str()))
            .order((budgets::start_date.asc(), budgets::id.asc()))
            .select(BudgetDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        budgets_to_domain(rows)
    }

    fn get_budget_categories(&self, budget_id: &str) -> Result<Vec<BudgetCategory>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = budget_categories::table
            .filter(budget_categories::budget_id.eq(budget_id))
            .order(budget_categories::category_id.asc())
            .select(BudgetCategoryDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        categories_to_domain(rows)
    }

    fn find_exceeded_categories(&self, budget_id: &str) -> Result<Vec<BudgetCategory>> {
        // Amounts are TEXT, so the comparison happens on decoded decimals.
        Ok(self
            .get_budget_categories(budget_id)?
            .into_iter()
            .filter(BudgetCategory::is_exceeded)
            .collect())
    }

    fn find_active_budget_categories(
        &self,
        owner_id: &str,
        category_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<BudgetCategory>> {
        let mut conn = get_connection(&self.pool)?;
        let budget_ids: Vec<String> = budgets::table
            .filter(budgets::owner_id.eq(owner_id))
            .filter(budgets::status.eq(BudgetStatus::Active.as_str()))
            .filter(budgets::start_date.le(date))
            .filter(budgets::end_date.ge(date))
            .select(budgets::id)
            .load(&mut conn)
            .map_err(StorageError::from)?;

        let mut rows = Vec::new();
        for chunk in chunk_for_sqlite(&budget_ids) {
            let mut loaded = budget_categories::table
                .filter(budget_categories::budget_id.eq_any(chunk))
                .filter(budget_categories::category_id.eq(category_id))
                .select(BudgetCategoryDB::as_select())
                .load(&mut conn)
                .map_err(StorageError::from)?;
            rows.append(&mut loaded);
        }
        categories_to_domain(rows)
    }

    async fn create_budget(&self, new_budget: NewBudget, status: BudgetStatus) -> Result<Budget> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Budget> {
                let id = new_budget
                    .id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                let row = NewBudgetDB::from_domain(&new_budget, id, status, Utc::now().naive_utc());

                let created = diesel::insert_into(budgets::table)
                    .values(&row)
                    .returning(BudgetDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;

                let limits: Vec<BudgetCategoryDB> = new_budget
                    .categories
                    .iter()
                    .map(|limit| BudgetCategoryDB {
                        id: Uuid::new_v4().to_string(),
                        budget_id: created.id.clone(),
                        category_id: limit.category_id.clone(),
                        limit_amount: decimal_text(limit.limit_amount),
                        spent_amount: decimal_text(Decimal::ZERO),
                    })
                    .collect();
                if !limits.is_empty() {
                    diesel::insert_into(budget_categories::table)
                        .values(&limits)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }

                Ok(Budget::try_from(created)?)
            })
            .await
    }

    async fn add_budget_category(
        &self,
        budget_id: &str,
        new_category: NewBudgetCategory,
    ) -> Result<BudgetCategory> {
        let budget_id = budget_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<BudgetCategory> {
                budgets::table
                    .find(&budget_id)
                    .select(budgets::id)
                    .first::<String>(conn)
                    .map_err(not_found_as("budget", &budget_id))?;

                if load_budget_category(conn, &budget_id, &new_category.category_id)?.is_some() {
                    return Err(Error::InvalidState(format!(
                        "Budget '{}' already has a limit for category '{}'",
                        budget_id, new_category.category_id
                    )));
                }

                let row = BudgetCategoryDB {
                    id: Uuid::new_v4().to_string(),
                    budget_id: budget_id.clone(),
                    category_id: new_category.category_id,
                    limit_amount: decimal_text(new_category.limit_amount),
                    spent_amount: decimal_text(Decimal::ZERO),
                };
                let created = diesel::insert_into(budget_categories::table)
                    .values(&row)
                    .returning(BudgetCategoryDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(BudgetCategory::try_from(created)?)
            })
            .await
    }

    async fn update_budget_status(&self, budget_id: &str, status: BudgetStatus) -> Result<Budget> {
        let budget_id = budget_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Budget> {
                let updated = diesel::update(budgets::table.find(&budget_id))
                    .set((
                        budgets::status.eq(status.as_str()),
                        budgets::updated_at.eq(Utc::now().naive_utc()),
                    ))
                    .returning(BudgetDB::as_returning())
                    .get_result(conn)
                    .map_err(not_found_as("budget", &budget_id))?;
                Ok(Budget::try_from(updated)?)
            })
            .await
    }

    async fn overwrite_spent_amount(
        &self,
        budget_id: &str,
        category_id: &str,
        total: Decimal,
    ) -> Result<SpentChange> {
        let (budget_id, category_id) = (budget_id.to_string(), category_id.to_string());
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<SpentChange> {
                let mut row = require_budget_category(conn, &budget_id, &category_id)?;
                let change = row.overwrite_spent(total);
                store_spent_amount(conn, &row)?;
                Ok(change)
            })
            .await
    }

    async fn increment_spent_amounts(
        &self,
        event_key: Option<String>,
        increments: Vec<SpentIncrement>,
    ) -> Result<Option<Vec<SpentChange>>> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Option<Vec<SpentChange>>> {
                if let Some(key) = &event_key {
                    let seen = spend_events::table
                        .find(key)
                        .select(spend_events::event_key)
                        .first::<String>(conn)
                        .optional()
                        .map_err(StorageError::from)?;
                    if seen.is_some() {
                        debug!("Spend event '{}' already applied", key);
                        return Ok(None);
                    }
                }

                // Any missing target fails the job and rolls back the earlier rows.
                let mut changes = Vec::with_capacity(increments.len());
                for increment in &increments {
                    let mut row =
                        require_budget_category(conn, &increment.budget_id, &increment.category_id)?;
                    changes.push(row.apply_spent_delta(increment.amount));
                    store_spent_amount(conn, &row)?;
                }

                if let Some(event_key) = event_key {
                    diesel::insert_into(spend_events::table)
                        .values(&SpendEventDB {
                            event_key,
                            recorded_at: Utc::now().naive_utc(),
                        })
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(Some(changes))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{date, setup_db};
    use rust_decimal_macros::dec;

    async fn seeded() -> (BudgetRepository, tempfile::TempDir) {
        let (pool, writer, dir) = setup_db();
        let repo = BudgetRepository::new(pool, writer);
        repo.create_budget(
            NewBudget {
                id: Some("b1".to_string()),
                owner_id: "u1".to_string(),
                name: "January".to_string(),
                start_date: date(2025, 1, 1),
                end_date: date(2025, 1, 31),
                categories: vec![
                    NewBudgetCategory {
                        category_id: "groceries".to_string(),
                        limit_amount: dec!(500),
                    },
                    NewBudgetCategory {
                        category_id: "dining".to_string(),
                        limit_amount: dec!(200),
                    },
                ],
            },
            BudgetStatus::Active,
        )
        .await
        .unwrap();
        (repo, dir)
    }

    fn increment(category: &str, amount: Decimal) -> SpentIncrement {
        SpentIncrement {
            budget_id: "b1".to_string(),
            category_id: category.to_string(),
            amount,
        }
    }

    fn spent(repo: &BudgetRepository, category: &str) -> Decimal {
        repo.get_budget_categories("b1")
            .unwrap()
            .into_iter()
            .find(|c| c.category_id == category)
            .map(|c| c.spent_amount)
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_budget_with_limits() {
        let (repo, _dir) = seeded().await;

        let budget = repo.get_budget("b1").unwrap();
        assert_eq!(budget.status, BudgetStatus::Active);
        let categories = repo.get_budget_categories("b1").unwrap();
        assert_eq!(categories.len(), 2);
        assert!(categories.iter().all(|c| c.spent_amount == Decimal::ZERO));
        assert_eq!(repo.list_budgets_by_owner("u1").unwrap(), vec![budget]);
        assert!(repo.get_budget("missing").unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_increment_is_idempotent_per_event_key() {
        let (repo, _dir) = seeded().await;
        let key = Some("t1:created".to_string());

        let first = repo
            .increment_spent_amounts(key.clone(), vec![increment("groceries", dec!(150))])
            .await
            .unwrap();
        assert_eq!(first.unwrap()[0].spent, dec!(150));

        let replay = repo
            .increment_spent_amounts(key, vec![increment("groceries", dec!(150))])
            .await
            .unwrap();
        assert!(replay.is_none());
        assert_eq!(spent(&repo, "groceries"), dec!(150));
    }

    #[tokio::test]
    async fn test_increment_rolls_back_on_missing_target() {
        let (repo, _dir) = seeded().await;

        let err = repo
            .increment_spent_amounts(
                Some("t2:created".to_string()),
                vec![increment("groceries", dec!(10)), increment("fuel", dec!(10))],
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(spent(&repo, "groceries"), Decimal::ZERO);

        // The key was not recorded, so a corrected retry still applies.
        let retry = repo
            .increment_spent_amounts(
                Some("t2:created".to_string()),
                vec![increment("groceries", dec!(10))],
            )
            .await
            .unwrap();
        assert!(retry.is_some());
        assert_eq!(spent(&repo, "groceries"), dec!(10));
    }

    #[tokio::test]
    async fn test_spent_floors_at_zero_and_overwrite() {
        let (repo, _dir) = seeded().await;
        repo.increment_spent_amounts(None, vec![increment("dining", dec!(30))])
            .await
            .unwrap();

        let changes = repo
            .increment_spent_amounts(None, vec![increment("dining", dec!(-50))])
            .await
            .unwrap()
            .unwrap();
        assert!(changes[0].hit_floor());
        assert_eq!(spent(&repo, "dining"), Decimal::ZERO);

        let change = repo
            .overwrite_spent_amount("b1", "dining", dec!(250.75))
            .await
            .unwrap();
        assert_eq!(change.previous, Decimal::ZERO);
        assert_eq!(spent(&repo, "dining"), dec!(250.75));

        let exceeded = repo.find_exceeded_categories("b1").unwrap();
        assert_eq!(exceeded.len(), 1);
        assert_eq!(exceeded[0].category_id, "dining");
    }

    #[tokio::test]
    async fn test_add_budget_category_rejects_duplicates() {
        let (repo, _dir) = seeded().await;

        let added = repo
            .add_budget_category(
                "b1",
                NewBudgetCategory {
                    category_id: "fuel".to_string(),
                    limit_amount: dec!(80),
                },
            )
            .await
            .unwrap();
        assert_eq!(added.limit_amount, dec!(80));

        let duplicate = repo
            .add_budget_category(
                "b1",
                NewBudgetCategory {
                    category_id: "fuel".to_string(),
                    limit_amount: dec!(90),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(duplicate, Error::InvalidState(_)));

        let missing = repo
            .add_budget_category(
                "nope",
                NewBudgetCategory {
                    category_id: "fuel".to_string(),
                    limit_amount: dec!(90),
                },
            )
            .await
            .unwrap_err();
        assert!(missing.is_not_found());
    }

    #[tokio::test]
    async fn test_find_active_budget_categories_by_window_and_status() {
        let (repo, _dir) = seeded().await;

        let found = repo
            .find_active_budget_categories("u1", "groceries", date(2025, 1, 31))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(repo
            .find_active_budget_categories("u1", "groceries", date(2025, 2, 1))
            .unwrap()
            .is_empty());
        assert!(repo
            .find_active_budget_categories("u2", "groceries", date(2025, 1, 15))
            .unwrap()
            .is_empty());

        repo.update_budget_status("b1", BudgetStatus::Completed)
            .await
            .unwrap();
        assert!(repo
            .find_active_budget_categories("u1", "groceries", date(2025, 1, 15))
            .unwrap()
            .is_empty());
        assert_eq!(
            repo.list_budgets_by_status(BudgetStatus::Completed)
                .unwrap()
                .len(),
            1
        );
    }
}
