//! Threshold rule domain models.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::alerts::DispatchOutcome;
use crate::errors::{require_field, Error, Result, ValidationError};
use crate::utils::time_utils::{sub_days, sub_months};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionType {
    GreaterThan,
    LessThan,
    EqualTo,
}

impl ConditionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionType::GreaterThan => "GREATER_THAN",
            ConditionType::LessThan => "LESS_THAN",
            ConditionType::EqualTo => "EQUAL_TO",
        }
    }

    /// Whether `sum` violates the rule. `EqualTo` is exact decimal equality.
    pub fn is_met(&self, sum: Decimal, threshold: Decimal) -> bool {
        match self {
            ConditionType::GreaterThan => sum > threshold,
            ConditionType::LessThan => sum < threshold,
            ConditionType::EqualTo => sum == threshold,
        }
    }

    /// Direction phrase used in alert messages.
    pub fn describe(&self) -> &'static str {
        match self {
            ConditionType::GreaterThan => "exceeded",
            ConditionType::LessThan => "fallen below",
            ConditionType::EqualTo => "reached exactly",
        }
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionType {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "GREATER_THAN" => Ok(ConditionType::GreaterThan),
            "LESS_THAN" => Ok(ConditionType::LessThan),
            "EQUAL_TO" => Ok(ConditionType::EqualTo),
            other => Err(ValidationError::InvalidInput(format!(
                "Unknown condition type '{}'",
                other
            ))
            .into()),
        }
    }
}

/// Length of a rule's rolling window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RulePeriod {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl RulePeriod {
    pub const ALL: [RulePeriod; 5] = [
        RulePeriod::Daily,
        RulePeriod::Weekly,
        RulePeriod::Monthly,
        RulePeriod::Quarterly,
        RulePeriod::Yearly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RulePeriod::Daily => "DAILY",
            RulePeriod::Weekly => "WEEKLY",
            RulePeriod::Monthly => "MONTHLY",
            RulePeriod::Quarterly => "QUARTERLY",
            RulePeriod::Yearly => "YEARLY",
        }
    }

    /// Inclusive rolling window ending on `today`. Independent of any
    /// budget's calendar period.
    pub fn window(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = match self {
            RulePeriod::Daily => today,
            RulePeriod::Weekly => sub_days(today, 7),
            RulePeriod::Monthly => sub_months(today, 1),
            RulePeriod::Quarterly => sub_months(today, 3),
            RulePeriod::Yearly => sub_months(today, 12),
        };
        (start, today)
    }

    pub fn describe(&self) -> &'static str {
        match self {
            RulePeriod::Daily => "today",
            RulePeriod::Weekly => "the last 7 days",
            RulePeriod::Monthly => "the last month",
            RulePeriod::Quarterly => "the last 3 months",
            RulePeriod::Yearly => "the last year",
        }
    }
}

impl fmt::Display for RulePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RulePeriod {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        RulePeriod::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                ValidationError::InvalidInput(format!("Unknown rule period '{}'", s)).into()
            })
    }
}

/// Domain model representing a user-defined threshold rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub owner_id: String,
    /// `None` applies the rule across all of the owner's categories.
    pub category_id: Option<String>,
    pub condition_type: ConditionType,
    pub threshold: Decimal,
    pub period: RulePeriod,
    pub active: bool,
}

impl Rule {
    /// Whether a transaction in `category_id` can affect this rule.
    pub fn applies_to_category(&self, category_id: Option<&str>) -> bool {
        match (&self.category_id, category_id) {
            (None, _) => true,
            (Some(rule_category), Some(category)) => rule_category == category,
            (Some(_), None) => false,
        }
    }
}

/// Input model for creating a rule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRule {
    pub id: Option<String>,
    pub owner_id: String,
    pub category_id: Option<String>,
    pub condition_type: ConditionType,
    pub threshold: Decimal,
    pub period: RulePeriod,
    pub active: bool,
}

impl NewRule {
    pub fn validate(&self) -> Result<()> {
        require_field(&self.owner_id, "ownerId")?;
        if self.threshold < Decimal::ZERO {
            return Err(ValidationError::InvalidInput(
                "Rule threshold cannot be negative".to_string(),
            )
            .into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSkipReason {
    Inactive,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    /// The condition held; `alert` reports whether a new alert was stored.
    Triggered { sum: Decimal, alert: DispatchOutcome },
    /// The condition did not hold.
    Satisfied { sum: Decimal },
    Skipped(RuleSkipReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleEvaluation {
    pub rule_id: String,
    pub outcome: RuleOutcome,
}

impl RuleEvaluation {
    pub fn is_triggered(&self) -> bool {
        matches!(self.outcome, RuleOutcome::Triggered { .. })
    }
}
