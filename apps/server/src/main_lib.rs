use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{Config, LogFormat};
use crate::domain_events::LoggingDomainEventSink;
use spendwatch_core::{
    alerts::AlertService,
    budgets::BudgetService,
    events::{DomainEvent, DomainEventSink},
    goals::GoalService,
    rules::RuleService,
    scheduler::{EvaluationScheduler, SchedulerSources},
    spending::SpendAggregator,
    utils::{Clock, SystemClock},
};
use spendwatch_storage_sqlite::{
    db::{self, spawn_writer},
    AlertRepository, BudgetRepository, CategoryRepository, GoalRepository, RuleRepository,
    TransactionRepository,
};

pub struct AppState {
    pub scheduler: Arc<EvaluationScheduler>,
    pub clock: Arc<dyn Clock>,
    pub db_path: String,
}

/// Installs the tracing subscriber. `log` records from the library crates
/// are bridged into it.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init(),
    }
}

/// Opens the database and wires repositories into the engine services.
///
/// Returns the receiving end of the domain event channel; the caller runs
/// the queue worker on it.
pub async fn build_state(
    config: &Config,
    shutdown: watch::Receiver<bool>,
) -> anyhow::Result<(Arc<AppState>, mpsc::UnboundedReceiver<DomainEvent>)> {
    // Point DATABASE_URL at SW_DB_PATH so storage resolves the same file.
    std::env::set_var("DATABASE_URL", &config.db_path);
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = spawn_writer((*pool).clone());

    let (sink, events_rx) = LoggingDomainEventSink::new();
    let domain_event_sink: Arc<dyn DomainEventSink> = Arc::new(sink);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(config.timezone));
    let settings = config.settings.clone();

    let category_repository = Arc::new(CategoryRepository::new(pool.clone(), writer.clone()));
    let transaction_repository =
        Arc::new(TransactionRepository::new(pool.clone(), writer.clone()));
    let budget_repository = Arc::new(BudgetRepository::new(pool.clone(), writer.clone()));
    let rule_repository = Arc::new(RuleRepository::new(pool.clone(), writer.clone()));
    let goal_repository = Arc::new(GoalRepository::new(pool.clone(), writer.clone()));
    let alert_repository = Arc::new(AlertRepository::new(pool.clone(), writer));

    let alert_service = Arc::new(AlertService::new(
        alert_repository,
        domain_event_sink.clone(),
    ));
    let spend_aggregator = Arc::new(SpendAggregator::new(
        budget_repository.clone(),
        transaction_repository.clone(),
        category_repository.clone(),
        domain_event_sink.clone(),
    ));
    let budget_service = Arc::new(BudgetService::new(
        budget_repository.clone(),
        category_repository.clone(),
        spend_aggregator.clone(),
        alert_service.clone(),
        domain_event_sink.clone(),
        clock.clone(),
        settings.clone(),
    ));
    let rule_service = Arc::new(RuleService::new(
        rule_repository.clone(),
        transaction_repository.clone(),
        category_repository,
        alert_service.clone(),
        clock.clone(),
    ));
    let goal_service = Arc::new(GoalService::new(
        goal_repository.clone(),
        transaction_repository,
        alert_service,
        domain_event_sink,
        clock.clone(),
        settings.clone(),
    ));

    let scheduler = Arc::new(EvaluationScheduler::new(
        SchedulerSources {
            budgets: budget_repository,
            rules: rule_repository,
            goals: goal_repository,
        },
        budget_service,
        rule_service,
        goal_service,
        spend_aggregator,
        settings.worker_concurrency,
        shutdown,
    ));

    let state = AppState {
        scheduler,
        clock,
        db_path,
    };
    Ok((Arc::new(state), events_rx))
}
