use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::model::{GoalDB, NewGoalDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{not_found_as, IntoCore, StorageError};
use crate::schema::goals;
use crate::utils::decimal_text;
use spendwatch_core::goals::{Goal, GoalProgress, GoalProgressReset, GoalRepositoryTrait, NewGoal};
use spendwatch_core::Result;

pub struct GoalRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl GoalRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        GoalRepository { pool, writer }
    }
}

#[async_trait]
impl GoalRepositoryTrait for GoalRepository {
    fn get_goal(&self, goal_id: &str) -> Result<Goal> {
        let mut conn = get_connection(&self.pool)?;
        let row = goals::table
            .find(goal_id)
            .select(GoalDB::as_select())
            .first(&mut conn)
            .map_err(not_found_as("goal", goal_id))?;
        Ok(Goal::try_from(row)?)
    }

    fn list_goals_by_owner(&self, owner_id: &str) -> Result<Vec<Goal>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = goals::table
            .filter(goals::owner_id.eq(owner_id))
            .order((goals::created_at.asc(), goals::id.asc()))
            .select(GoalDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter()
            .map(|row| Goal::try_from(row).map_err(Into::into))
            .collect()
    }

    fn list_owners_with_open_goals(&self) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;
        let owners = goals::table
            .filter(goals::completed.eq(false))
            .select(goals::owner_id)
            .distinct()
            .order(goals::owner_id.asc())
            .load::<String>(&mut conn)
            .into_core()?;
        Ok(owners)
    }

    async fn insert_new_goal(&self, new_goal: NewGoal) -> Result<Goal> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Goal> {
                let id = new_goal
                    .id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                let row = NewGoalDB::from_domain(new_goal, id, Utc::now().naive_utc());

                let created = diesel::insert_into(goals::table)
                    .values(&row)
                    .returning(GoalDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(Goal::try_from(created)?)
            })
            .await
    }

    async fn add_progress(&self, goal_id: &str, amount: Decimal) -> Result<GoalProgress> {
        let goal_id = goal_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<GoalProgress> {
                let row = goals::table
                    .find(&goal_id)
                    .select(GoalDB::as_select())
                    .first(conn)
                    .map_err(not_found_as("goal", &goal_id))?;
                let mut goal = Goal::try_from(row)?;
                let newly_completed = goal.add_contribution(amount);

                diesel::update(goals::table.find(&goal_id))
                    .set((
                        goals::current_amount.eq(decimal_text(goal.current_amount)),
                        goals::completed.eq(goal.completed),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(GoalProgress {
                    goal,
                    newly_completed,
                })
            })
            .await
    }

    async fn replace_progress(
        &self,
        owner_id: &str,
        resets: Vec<GoalProgressReset>,
    ) -> Result<usize> {
        let owner_id = owner_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let mut written = 0;
                for reset in resets {
                    written += diesel::update(
                        goals::table
                            .filter(goals::id.eq(&reset.goal_id))
                            .filter(goals::owner_id.eq(&owner_id)),
                    )
                    .set((
                        goals::current_amount.eq(decimal_text(reset.current_amount)),
                        goals::completed.eq(reset.completed),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                }
                Ok(written)
            })
            .await
    }

    async fn delete_goal(&self, goal_id: &str) -> Result<()> {
        let goal_id = goal_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::delete(goals::table.find(goal_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}
