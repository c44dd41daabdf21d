//! Background timers for the evaluation batches.
//!
//! One tick per day at `SW_DAILY_RUN_HOUR` (UTC). The tick runs the nightly
//! reconciliation, the daily jobs, the weekly job on Mondays and the
//! monthly job on the 1st, with weekday and day-of-month taken in the
//! configured timezone.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveDate, Utc, Weekday};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

use crate::main_lib::AppState;
use spendwatch_core::scheduler::{BatchReport, ScheduledJob};

/// Jobs due on a tick, in run order. Reconciliation goes first so the
/// budget evaluation that follows sees repaired totals.
pub fn jobs_due_on(today: NaiveDate) -> Vec<ScheduledJob> {
    let mut jobs = vec![
        ScheduledJob::NightlyReconciliation,
        ScheduledJob::DailyBudgets,
        ScheduledJob::DailyRules,
        ScheduledJob::DailyGoals,
    ];
    if today.weekday() == Weekday::Mon {
        jobs.push(ScheduledJob::WeeklyRules);
    }
    if today.day() == 1 {
        jobs.push(ScheduledJob::MonthlyRules);
    }
    jobs
}

/// Next instant strictly after `now` at `hour:00` UTC.
pub fn next_run_after(now: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    let today_run = now
        .date_naive()
        .and_hms_opt(hour.min(23), 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(now);
    if today_run > now {
        today_run
    } else {
        today_run + ChronoDuration::days(1)
    }
}

/// Starts the daily loop. It returns once `shutdown` flips to `true`.
pub fn start_evaluation_scheduler(
    state: Arc<AppState>,
    daily_run_hour: u32,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Evaluation scheduler started (daily run at {:02}:00 UTC)", daily_run_hour);

        loop {
            let now = Utc::now();
            let next = next_run_after(now, daily_run_hour);
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            info!("Next evaluation run at {}", next);

            tokio::select! {
                _ = sleep(wait) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            run_tick(&state).await;
            if *shutdown.borrow() {
                break;
            }
        }

        info!("Evaluation scheduler stopped");
    })
}

async fn run_tick(state: &Arc<AppState>) {
    let today = state.clock.today();
    for job in jobs_due_on(today) {
        match run_job(state, job).await {
            Ok(report) => log_report(&report),
            Err(e) => warn!("Scheduled job {} could not start: {}", job, e),
        }
    }
}

async fn run_job(
    state: &Arc<AppState>,
    job: ScheduledJob,
) -> spendwatch_core::Result<BatchReport> {
    let scheduler = &state.scheduler;
    match job {
        ScheduledJob::DailyBudgets => scheduler.run_daily_budgets().await,
        ScheduledJob::DailyRules => scheduler.run_daily_rules().await,
        ScheduledJob::WeeklyRules => scheduler.run_weekly_rules().await,
        ScheduledJob::MonthlyRules => scheduler.run_monthly_rules().await,
        ScheduledJob::DailyGoals => scheduler.run_daily_goals().await,
        ScheduledJob::NightlyReconciliation => scheduler.run_nightly_reconciliation().await,
    }
}

fn log_report(report: &BatchReport) {
    if report.failed > 0 || report.cancelled > 0 {
        warn!(
            job = %report.job,
            processed = report.processed,
            failed = report.failed,
            cancelled = report.cancelled,
            "Scheduled job finished with problems"
        );
    } else {
        info!(
            job = %report.job,
            processed = report.processed,
            "Scheduled job finished"
        );
    }
}
