use std::fmt;

use serde::Serialize;

use crate::rules::RulePeriod;

/// Periodic batch entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduledJob {
    DailyBudgets,
    DailyRules,
    WeeklyRules,
    MonthlyRules,
    DailyGoals,
    NightlyReconciliation,
}

impl ScheduledJob {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduledJob::DailyBudgets => "DAILY_BUDGETS",
            ScheduledJob::DailyRules => "DAILY_RULES",
            ScheduledJob::WeeklyRules => "WEEKLY_RULES",
            ScheduledJob::MonthlyRules => "MONTHLY_RULES",
            ScheduledJob::DailyGoals => "DAILY_GOALS",
            ScheduledJob::NightlyReconciliation => "NIGHTLY_RECONCILIATION",
        }
    }

    /// Rule periods a rules job covers. Quarterly and yearly rules ride on the
    /// monthly run.
    pub fn rule_periods(&self) -> &'static [RulePeriod] {
        match self {
            ScheduledJob::DailyRules => &[RulePeriod::Daily],
            ScheduledJob::WeeklyRules => &[RulePeriod::Weekly],
            ScheduledJob::MonthlyRules => &[
                RulePeriod::Monthly,
                RulePeriod::Quarterly,
                RulePeriod::Yearly,
            ],
            _ => &[],
        }
    }
}

impl fmt::Display for ScheduledJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts for one batch run. `cancelled` entities were never started because
/// shutdown was requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub job: ScheduledJob,
    pub processed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl BatchReport {
    pub fn empty(job: ScheduledJob) -> Self {
        Self {
            job,
            processed: 0,
            failed: 0,
            cancelled: 0,
        }
    }

    pub fn merge(mut self, other: &BatchReport) -> Self {
        self.processed += other.processed;
        self.failed += other.failed;
        self.cancelled += other.cancelled;
        self
    }

    pub fn total(&self) -> usize {
        self.processed + self.failed + self.cancelled
    }
}
