use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ATTENTION_PERCENT, DEFAULT_ENDING_SOON_DAYS, DEFAULT_GOAL_RISK_PERCENT,
    DEFAULT_GOAL_RISK_WINDOW_DAYS, DEFAULT_WORKER_CONCURRENCY,
};

/// Tunables shared by the evaluators and the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationSettings {
    /// A budget ending within this many days needs attention.
    pub ending_soon_days: i64,
    /// A category at or above this share of its limit needs attention.
    pub attention_percent: u32,
    /// Risk checks only apply to goals due within this many days.
    pub goal_risk_window_days: i64,
    /// Goals below this completion percentage inside the window are at risk.
    pub goal_risk_percent: u32,
    /// Upper bound on entities evaluated concurrently by a batch.
    pub worker_concurrency: usize,
}

impl EvaluationSettings {
    pub fn attention_threshold(&self) -> Decimal {
        Decimal::from(self.attention_percent)
    }

    pub fn goal_risk_threshold(&self) -> Decimal {
        Decimal::from(self.goal_risk_percent)
    }
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            ending_soon_days: DEFAULT_ENDING_SOON_DAYS,
            attention_percent: DEFAULT_ATTENTION_PERCENT,
            goal_risk_window_days: DEFAULT_GOAL_RISK_WINDOW_DAYS,
            goal_risk_percent: DEFAULT_GOAL_RISK_PERCENT,
            worker_concurrency: DEFAULT_WORKER_CONCURRENCY,
        }
    }
}
