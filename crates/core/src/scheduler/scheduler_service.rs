use std::future::Future;
use std::sync::Arc;

use futures::{future, stream, StreamExt};
use log::{error, info, warn};
use tokio::sync::watch;

use crate::budgets::{BudgetRepositoryTrait, BudgetServiceTrait, BudgetStatus};
use crate::errors::Result;
use crate::goals::{GoalRepositoryTrait, GoalServiceTrait};
use crate::rules::{RuleRepositoryTrait, RuleServiceTrait};
use crate::scheduler::{BatchReport, ScheduledJob};
use crate::spending::SpendAggregatorTrait;

/// Repositories the scheduler lists entities from.
pub struct SchedulerSources {
    pub budgets: Arc<dyn BudgetRepositoryTrait>,
    pub rules: Arc<dyn RuleRepositoryTrait>,
    pub goals: Arc<dyn GoalRepositoryTrait>,
}

/// Fans periodic evaluation out over every budget, rule owner and goal owner.
///
/// Entities are independent units of work run on a bounded pool. A failed
/// entity is logged and counted. Once shutdown is signalled no new entity is
/// started; finished ones stay committed.
pub struct EvaluationScheduler {
    sources: SchedulerSources,
    budget_service: Arc<dyn BudgetServiceTrait>,
    rule_service: Arc<dyn RuleServiceTrait>,
    goal_service: Arc<dyn GoalServiceTrait>,
    spend_aggregator: Arc<dyn SpendAggregatorTrait>,
    concurrency: usize,
    shutdown: watch::Receiver<bool>,
}

impl EvaluationScheduler {
    pub fn new(
        sources: SchedulerSources,
        budget_service: Arc<dyn BudgetServiceTrait>,
        rule_service: Arc<dyn RuleServiceTrait>,
        goal_service: Arc<dyn GoalServiceTrait>,
        spend_aggregator: Arc<dyn SpendAggregatorTrait>,
        concurrency: usize,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            sources,
            budget_service,
            rule_service,
            goal_service,
            spend_aggregator,
            concurrency: concurrency.max(1),
            shutdown,
        }
    }

    /// Moves UPCOMING and ACTIVE budgets through their lifecycle and raises
    /// over-limit alerts.
    pub async fn run_daily_budgets(&self) -> Result<BatchReport> {
        let mut budget_ids = self.budget_ids(BudgetStatus::Upcoming)?;
        budget_ids.extend(self.budget_ids(BudgetStatus::Active)?);

        let service = self.budget_service.clone();
        Ok(self
            .fan_out(ScheduledJob::DailyBudgets, budget_ids, move |budget_id| {
                let service = service.clone();
                async move { service.evaluate_budget(&budget_id).await.map(|_| ()) }
            })
            .await)
    }

    pub async fn run_daily_rules(&self) -> Result<BatchReport> {
        self.run_rules(ScheduledJob::DailyRules).await
    }

    /// Weekly rules plus the goal risk pass.
    pub async fn run_weekly_rules(&self) -> Result<BatchReport> {
        let rules = self.run_rules(ScheduledJob::WeeklyRules).await?;
        let goals = self.run_goals(ScheduledJob::WeeklyRules).await?;
        Ok(rules.merge(&goals))
    }

    pub async fn run_monthly_rules(&self) -> Result<BatchReport> {
        self.run_rules(ScheduledJob::MonthlyRules).await
    }

    pub async fn run_daily_goals(&self) -> Result<BatchReport> {
        self.run_goals(ScheduledJob::DailyGoals).await
    }

    /// Recomputes every ACTIVE budget from the ledger, repairing any drift
    /// left by lost or failed deltas.
    pub async fn run_nightly_reconciliation(&self) -> Result<BatchReport> {
        let budget_ids = self.budget_ids(BudgetStatus::Active)?;
        let aggregator = self.spend_aggregator.clone();
        Ok(self
            .fan_out(
                ScheduledJob::NightlyReconciliation,
                budget_ids,
                move |budget_id| {
                    let aggregator = aggregator.clone();
                    async move { aggregator.recompute(&budget_id).await.map(|_| ()) }
                },
            )
            .await)
    }

    async fn run_rules(&self, job: ScheduledJob) -> Result<BatchReport> {
        let owners = self.sources.rules.list_owners_with_active_rules()?;
        let service = self.rule_service.clone();
        let periods = job.rule_periods();
        Ok(self
            .fan_out(job, owners, move |owner_id| {
                let service = service.clone();
                async move {
                    service
                        .evaluate_rules_for_user_with_periods(&owner_id, periods)
                        .await
                        .map(|_| ())
                }
            })
            .await)
    }

    async fn run_goals(&self, job: ScheduledJob) -> Result<BatchReport> {
        let owners = self.sources.goals.list_owners_with_open_goals()?;
        let service = self.goal_service.clone();
        Ok(self
            .fan_out(job, owners, move |owner_id| {
                let service = service.clone();
                async move { service.evaluate_goals_for_user(&owner_id).await.map(|_| ()) }
            })
            .await)
    }

    fn budget_ids(&self, status: BudgetStatus) -> Result<Vec<String>> {
        Ok(self
            .sources
            .budgets
            .list_budgets_by_status(status)?
            .into_iter()
            .map(|budget| budget.id)
            .collect())
    }

    async fn fan_out<F, Fut>(&self, job: ScheduledJob, ids: Vec<String>, work: F) -> BatchReport
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let total = ids.len();
        let shutdown = self.shutdown.clone();

        let results: Vec<(String, Result<()>)> = stream::iter(ids)
            .take_while(move |_| future::ready(!*shutdown.borrow()))
            .map(|id| {
                let unit = work(id.clone());
                async move { (id, unit.await) }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = BatchReport::empty(job);
        for (id, result) in &results {
            match result {
                Ok(()) => report.processed += 1,
                Err(e) => {
                    report.failed += 1;
                    error!("{}: evaluation of '{}' failed: {}", job, id, e);
                }
            }
        }
        report.cancelled = total - results.len();

        if report.cancelled > 0 {
            warn!(
                "{}: shutdown requested, {} entit(ies) not started",
                job, report.cancelled
            );
        }
        info!(
            "{} finished: {} processed, {} failed",
            job, report.processed, report.failed
        );
        report
    }
}
