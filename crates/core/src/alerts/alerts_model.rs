//! Alert domain models.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, ValidationError};

/// The kind of entity that triggered an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSourceType {
    Budget,
    Rule,
    Goal,
}

impl AlertSourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSourceType::Budget => "BUDGET",
            AlertSourceType::Rule => "RULE",
            AlertSourceType::Goal => "GOAL",
        }
    }
}

impl fmt::Display for AlertSourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertSourceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUDGET" => Ok(AlertSourceType::Budget),
            "RULE" => Ok(AlertSourceType::Rule),
            "GOAL" => Ok(AlertSourceType::Goal),
            other => Err(ValidationError::InvalidInput(format!(
                "Unknown alert source type '{}'",
                other
            ))
            .into()),
        }
    }
}

/// What condition an alert reports. A single source can raise several kinds
/// (a goal can be at risk and later completed), so dedup is per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    BudgetExceeded,
    RuleTriggered,
    GoalCompleted,
    GoalAtRisk,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::BudgetExceeded => "BUDGET_EXCEEDED",
            AlertKind::RuleTriggered => "RULE_TRIGGERED",
            AlertKind::GoalCompleted => "GOAL_COMPLETED",
            AlertKind::GoalAtRisk => "GOAL_AT_RISK",
        }
    }

    pub fn source_type(&self) -> AlertSourceType {
        match self {
            AlertKind::BudgetExceeded => AlertSourceType::Budget,
            AlertKind::RuleTriggered => AlertSourceType::Rule,
            AlertKind::GoalCompleted | AlertKind::GoalAtRisk => AlertSourceType::Goal,
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUDGET_EXCEEDED" => Ok(AlertKind::BudgetExceeded),
            "RULE_TRIGGERED" => Ok(AlertKind::RuleTriggered),
            "GOAL_COMPLETED" => Ok(AlertKind::GoalCompleted),
            "GOAL_AT_RISK" => Ok(AlertKind::GoalAtRisk),
            other => Err(ValidationError::InvalidInput(format!(
                "Unknown alert kind '{}'",
                other
            ))
            .into()),
        }
    }
}

/// Domain model representing a notification tied to its triggering source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub owner_id: String,
    pub source_type: AlertSourceType,
    pub source_id: String,
    pub kind: AlertKind,
    pub message: String,
    pub read: bool,
    pub created_at: NaiveDateTime,
}

/// Input model for inserting an alert
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewAlert {
    pub owner_id: String,
    pub source_id: String,
    pub kind: AlertKind,
    pub message: String,
}

impl NewAlert {
    pub fn new(
        owner_id: impl Into<String>,
        kind: AlertKind,
        source_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            source_id: source_id.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn source_type(&self) -> AlertSourceType {
        self.kind.source_type()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// An unread alert of the same kind already exists for the source.
    Duplicate,
}

/// Result of a dispatch attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Created(Alert),
    Skipped(SkipReason),
}

impl DispatchOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, DispatchOutcome::Created(_))
    }
}
