use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::errors::Result;
use crate::goals::{Goal, GoalProgress, GoalProgressReset, NewGoal};
use crate::transactions::Transaction;

/// Trait for goal repository operations
#[async_trait]
pub trait GoalRepositoryTrait: Send + Sync {
    fn get_goal(&self, goal_id: &str) -> Result<Goal>;

    fn list_goals_by_owner(&self, owner_id: &str) -> Result<Vec<Goal>>;

    /// Distinct owners with at least one goal that is not completed.
    fn list_owners_with_open_goals(&self) -> Result<Vec<String>>;

    async fn insert_new_goal(&self, new_goal: NewGoal) -> Result<Goal>;

    /// Adds `amount` to the goal's progress in one unit of work, setting
    /// `completed` when the target is reached.
    async fn add_progress(&self, goal_id: &str, amount: Decimal) -> Result<GoalProgress>;

    /// Overwrites progress for the listed goals of the owner in one unit of work.
    async fn replace_progress(&self, owner_id: &str, resets: Vec<GoalProgressReset>)
        -> Result<usize>;

    async fn delete_goal(&self, goal_id: &str) -> Result<()>;
}

/// Trait for goal service operations
#[async_trait]
pub trait GoalServiceTrait: Send + Sync {
    fn get_goals(&self, owner_id: &str) -> Result<Vec<Goal>>;

    async fn create_goal(&self, new_goal: NewGoal) -> Result<Goal>;

    async fn delete_goal(&self, goal_id: &str, owner_id: &str) -> Result<()>;

    /// Adds a non-negative contribution, completing the goal (with one alert)
    /// when the target is reached, then runs the risk check.
    async fn update_goal_progress(
        &self,
        goal_id: &str,
        owner_id: &str,
        amount: Decimal,
    ) -> Result<Goal>;

    /// Feeds a newly created transaction into every matching goal of its owner.
    async fn process_transaction_for_goals(&self, transaction: &Transaction) -> Result<Vec<Goal>>;

    /// Runs the risk check over the owner's open goals; returns the number of
    /// new risk alerts.
    async fn evaluate_goals_for_user(&self, owner_id: &str) -> Result<usize>;

    async fn evaluate_all_goals(&self) -> Result<usize>;

    /// Resets every goal of the owner and replays the owner's full ledger.
    async fn sync_all_transactions_with_goals(&self, owner_id: &str) -> Result<Vec<Goal>>;
}
