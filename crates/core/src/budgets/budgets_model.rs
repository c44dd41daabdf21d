//! Budget domain models.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{require_field, Error, Result, ValidationError};
use crate::utils::decimal_utils::percent_of;

/// Budget lifecycle state. Transitions only move forward:
/// `Upcoming -> Active -> Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetStatus {
    Upcoming,
    Active,
    Completed,
}

impl BudgetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetStatus::Upcoming => "UPCOMING",
            BudgetStatus::Active => "ACTIVE",
            BudgetStatus::Completed => "COMPLETED",
        }
    }

    /// Status implied by the calendar alone.
    pub fn for_dates(start_date: NaiveDate, end_date: NaiveDate, today: NaiveDate) -> Self {
        if end_date < today {
            BudgetStatus::Completed
        } else if start_date <= today {
            BudgetStatus::Active
        } else {
            BudgetStatus::Upcoming
        }
    }

    fn rank(&self) -> u8 {
        match self {
            BudgetStatus::Upcoming => 0,
            BudgetStatus::Active => 1,
            BudgetStatus::Completed => 2,
        }
    }

    pub fn can_advance_to(&self, next: BudgetStatus) -> bool {
        next.rank() > self.rank()
    }
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetStatus {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "UPCOMING" => Ok(BudgetStatus::Upcoming),
            "ACTIVE" => Ok(BudgetStatus::Active),
            "COMPLETED" => Ok(BudgetStatus::Completed),
            other => Err(ValidationError::InvalidInput(format!(
                "Unknown budget status '{}'",
                other
            ))
            .into()),
        }
    }
}

/// Domain model representing a budget over a fixed calendar window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: BudgetStatus,
}

impl Budget {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// The status this budget should hold on `today`. Completed budgets stay
    /// completed regardless of dates.
    pub fn status_on(&self, today: NaiveDate) -> BudgetStatus {
        let by_date = BudgetStatus::for_dates(self.start_date, self.end_date, today);
        if self.status.can_advance_to(by_date) {
            by_date
        } else {
            self.status
        }
    }
}

/// Limit/spent pairing of one category within one budget.
///
/// `spent_amount` is never negative. It is only mutated through
/// [`BudgetCategory::apply_spent_delta`] and [`BudgetCategory::overwrite_spent`],
/// which the spend aggregator drives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetCategory {
    pub id: String,
    pub budget_id: String,
    pub category_id: String,
    pub limit_amount: Decimal,
    pub spent_amount: Decimal,
}

impl BudgetCategory {
    pub fn remaining(&self) -> Decimal {
        self.limit_amount - self.spent_amount
    }

    pub fn is_exceeded(&self) -> bool {
        self.spent_amount > self.limit_amount
    }

    pub fn usage_percent(&self) -> Decimal {
        percent_of(self.spent_amount, self.limit_amount)
    }

    /// Adds `delta`, flooring the result at zero.
    pub fn apply_spent_delta(&mut self, delta: Decimal) -> SpentChange {
        let previous = self.spent_amount;
        let attempted = previous + delta;
        self.spent_amount = attempted.max(Decimal::ZERO);
        SpentChange {
            budget_id: self.budget_id.clone(),
            category_id: self.category_id.clone(),
            previous,
            attempted,
            spent: self.spent_amount,
        }
    }

    /// Replaces the spent amount with a freshly computed total, flooring at zero.
    pub fn overwrite_spent(&mut self, total: Decimal) -> SpentChange {
        let previous = self.spent_amount;
        self.spent_amount = total.max(Decimal::ZERO);
        SpentChange {
            budget_id: self.budget_id.clone(),
            category_id: self.category_id.clone(),
            previous,
            attempted: total,
            spent: self.spent_amount,
        }
    }
}

/// One increment to apply to a budget category's spent amount.
#[derive(Debug, Clone, PartialEq)]
pub struct SpentIncrement {
    pub budget_id: String,
    pub category_id: String,
    pub amount: Decimal,
}

/// Result of one spent-amount write.
#[derive(Debug, Clone, PartialEq)]
pub struct SpentChange {
    pub budget_id: String,
    pub category_id: String,
    pub previous: Decimal,
    /// Value before the zero floor was applied.
    pub attempted: Decimal,
    pub spent: Decimal,
}

impl SpentChange {
    /// True when the write would have gone negative, which means the stored
    /// aggregate had drifted from the ledger.
    pub fn hit_floor(&self) -> bool {
        self.attempted < Decimal::ZERO
    }
}

/// Input model for a category limit on a new or existing budget
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBudgetCategory {
    pub category_id: String,
    pub limit_amount: Decimal,
}

impl NewBudgetCategory {
    pub fn validate(&self) -> Result<()> {
        require_field(&self.category_id, "categoryId")?;
        if self.limit_amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount("limitAmount".to_string()).into());
        }
        Ok(())
    }
}

/// Input model for creating a budget together with its category limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBudget {
    pub id: Option<String>,
    pub owner_id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub categories: Vec<NewBudgetCategory>,
}

impl NewBudget {
    pub fn validate(&self) -> Result<()> {
        require_field(&self.owner_id, "ownerId")?;
        require_field(&self.name, "name")?;
        if self.start_date > self.end_date {
            return Err(ValidationError::InvalidInput(format!(
                "Budget start date {} is after end date {}",
                self.start_date, self.end_date
            ))
            .into());
        }

        let mut seen = std::collections::HashSet::new();
        for category in &self.categories {
            category.validate()?;
            if !seen.insert(category.category_id.as_str()) {
                return Err(Error::InvalidState(format!(
                    "Category '{}' appears more than once in budget '{}'",
                    category.category_id, self.name
                )));
            }
        }
        Ok(())
    }
}

/// Aggregated usage of a single category within a budget
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUsage {
    pub category_id: String,
    pub limit_amount: Decimal,
    pub spent_amount: Decimal,
    pub remaining: Decimal,
    pub percent_used: Decimal,
}

/// Budget totals. Informational only, never persisted.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSummary {
    pub budget_id: String,
    pub total_budgeted: Decimal,
    pub total_spent: Decimal,
    pub remaining: Decimal,
    pub categories: Vec<CategoryUsage>,
}

impl BudgetSummary {
    pub fn from_categories(budget_id: &str, categories: &[BudgetCategory]) -> Self {
        let total_budgeted: Decimal = categories.iter().map(|c| c.limit_amount).sum();
        let total_spent: Decimal = categories.iter().map(|c| c.spent_amount).sum();
        Self {
            budget_id: budget_id.to_string(),
            total_budgeted,
            total_spent,
            remaining: total_budgeted - total_spent,
            categories: categories
                .iter()
                .map(|c| CategoryUsage {
                    category_id: c.category_id.clone(),
                    limit_amount: c.limit_amount,
                    spent_amount: c.spent_amount,
                    remaining: c.remaining(),
                    percent_used: c.usage_percent(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttentionReason {
    CategoryNearLimit {
        category_id: String,
        percent_used: Decimal,
    },
    EndingSoon {
        days_remaining: i64,
    },
}

/// An active budget flagged by the attention check, with every reason found.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetAttention {
    pub budget: Budget,
    pub reasons: Vec<AttentionReason>,
}

/// Outcome of evaluating one budget.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetEvaluation {
    pub budget_id: String,
    pub status: BudgetStatus,
    /// `(from, to)` when this evaluation moved the budget forward.
    pub transition: Option<(BudgetStatus, BudgetStatus)>,
    pub alerts_created: usize,
}
