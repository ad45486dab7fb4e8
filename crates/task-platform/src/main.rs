//! The task scheduling platform's entry point: wires every component
//! through `di::Platform::build`, runs startup reconciliation, then
//! drives the background reconciliation loop until a shutdown signal
//! arrives.

mod di;
mod reconciliation;
mod shutdown;
mod startup;
mod tasks;

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use task_config::ConfigLoader;
use tracing::{error, info, warn};

use reconciliation::ReconciliationLoop;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let loader = ConfigLoader::from_default_location()?;
    let config = loader.get().await;

    task_core::telemetry::init_telemetry(&config.telemetry)?;

    PrometheusBuilder::new()
        .install_recorder()
        .map(|_| ())
        .unwrap_or_else(|e| warn!(error = %e, "failed to install Prometheus recorder, metrics will be recorded but not exported"));
    task_service::register_metrics();

    startup::print_banner();

    let platform = di::Platform::build(config.clone()).await?;

    match platform.scheduler.ensure_default_instances().await {
        Ok(n) => info!(created = n, "startup: ensured default schedule instances"),
        Err(e) => error!(error = %e, "startup: failed to ensure default schedule instances"),
    }

    let legacy_cleaned = platform
        .scheduler
        .cleanup_legacy_artifacts(&config.scheduler.legacy_key_pattern)
        .await;
    if legacy_cleaned > 0 {
        info!(cleaned = legacy_cleaned, pattern = %config.scheduler.legacy_key_pattern, "startup: removed legacy scheduler artifacts");
    }

    startup::print_startup_info(
        &config.environment,
        platform.service.get_task_info(None).map(|info| info.tasks.len()).unwrap_or(0),
        config.scheduler.check_interval_secs,
        config.scheduler.retention_days,
    );

    let loop_handle = Arc::new(ReconciliationLoop::new(
        platform.scheduler.clone(),
        platform.execution_repo.clone(),
        config.scheduler.check_interval_secs,
        config.scheduler.retention_check_interval_secs,
        config.scheduler.retention_days,
    ));
    let loop_task = tokio::spawn(loop_handle.clone().run());

    shutdown::shutdown_signal().await;

    loop_handle.stop();
    if let Err(e) = loop_task.await {
        error!(error = %e, "reconciliation loop task panicked");
    }

    platform.db_pool.close().await;
    task_core::telemetry::shutdown_telemetry();

    info!("task-platform shut down cleanly");
    Ok(())
}
