//! Goals domain models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{require_field, Result, ValidationError};
use crate::settings::EvaluationSettings;
use crate::transactions::Transaction;
use crate::utils::decimal_utils::percent_of;
use crate::utils::time_utils::days_between;

/// Domain model representing a savings goal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    /// Transactions in this category count toward the goal. Goals without a
    /// category only progress through explicit contributions.
    pub category_id: Option<String>,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub target_date: NaiveDate,
    pub currency: String,
    pub completed: bool,
}

impl Goal {
    /// Adds a contribution. Returns true only when this call completed the goal;
    /// `completed` never goes back to false here.
    pub fn add_contribution(&mut self, amount: Decimal) -> bool {
        self.current_amount += amount;
        if !self.completed && self.current_amount >= self.target_amount {
            self.completed = true;
            return true;
        }
        false
    }

    /// Whether a transaction counts toward this goal: same category, strictly
    /// positive amount, same currency.
    pub fn matches_transaction(&self, transaction: &Transaction) -> bool {
        match (&self.category_id, &transaction.category_id) {
            (Some(goal_category), Some(category)) => {
                goal_category == category
                    && transaction.amount > Decimal::ZERO
                    && transaction.currency == self.currency
            }
            _ => false,
        }
    }

    pub fn percent_complete(&self) -> Decimal {
        percent_of(self.current_amount, self.target_amount)
    }

    pub fn amount_remaining(&self) -> Decimal {
        (self.target_amount - self.current_amount).max(Decimal::ZERO)
    }

    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        days_between(today, self.target_date)
    }

    /// Risk assessment: open goal, due within the risk window (but not past
    /// due), and below the completion threshold. A zero target is never at risk.
    pub fn risk(&self, today: NaiveDate, settings: &EvaluationSettings) -> Option<GoalRisk> {
        if self.completed || self.target_amount <= Decimal::ZERO {
            return None;
        }
        let days_remaining = self.days_remaining(today);
        if days_remaining <= 0 || days_remaining > settings.goal_risk_window_days {
            return None;
        }
        let percent_complete = self.percent_complete();
        if percent_complete >= settings.goal_risk_threshold() {
            return None;
        }
        Some(GoalRisk {
            days_remaining,
            percent_complete,
            amount_remaining: self.amount_remaining(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalRisk {
    pub days_remaining: i64,
    pub percent_complete: Decimal,
    pub amount_remaining: Decimal,
}

/// Input model for creating a goal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    pub id: Option<String>,
    pub owner_id: String,
    pub name: String,
    pub category_id: Option<String>,
    pub target_amount: Decimal,
    pub target_date: NaiveDate,
    pub currency: String,
}

impl NewGoal {
    pub fn validate(&self) -> Result<()> {
        require_field(&self.owner_id, "ownerId")?;
        require_field(&self.name, "name")?;
        require_field(&self.currency, "currency")?;
        if self.target_amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount("targetAmount".to_string()).into());
        }
        Ok(())
    }
}

/// Goal state after a progress update.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalProgress {
    pub goal: Goal,
    /// True when this update flipped `completed` from false to true.
    pub newly_completed: bool,
}

/// Replacement progress for one goal, written by a bulk resync.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalProgressReset {
    pub goal_id: String,
    pub current_amount: Decimal,
    pub completed: bool,
}
