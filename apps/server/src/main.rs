mod config;
mod domain_events;
mod main_lib;
mod scheduler;

use config::Config;
use domain_events::event_queue_worker;
use main_lib::{build_state, init_tracing};
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(config.log_format);
    for warning in &config.warnings {
        tracing::warn!("{}", warning);
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (state, events_rx) = build_state(&config, shutdown_rx.clone()).await?;
    let events_worker = tokio::spawn(event_queue_worker(events_rx));

    let scheduler_task =
        scheduler::start_evaluation_scheduler(state.clone(), config.daily_run_hour, shutdown_rx);
    tracing::info!(
        "Spendwatch daemon running (database: {}, timezone: {})",
        state.db_path,
        config.timezone
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested, finishing in-flight evaluations");
    shutdown_tx.send(true)?;
    scheduler_task.await?;

    // Dropping the last state handle closes the event channel.
    drop(state);
    events_worker.await?;
    Ok(())
}
