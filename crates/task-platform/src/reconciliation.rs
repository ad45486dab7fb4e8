//! Background reconciliation, grounded on
//! `arcana-jobs::scheduler::Scheduler::start`/`stop` loop shape —
//! minus its `try_acquire_leadership`/`release_leadership` machinery,
//! since cross-node leader election is out of scope here.
//! Runs two independent sweeps on their own cadence: orphan
//! reconciliation against the scheduler facade, and execution-history
//! retention against the execution repository.

use std::sync::Arc;
use std::time::Duration;

use task_repository::ExecutionRepository;
use task_scheduler::{InMemoryCronEngine, SchedulerFacade};
use tokio::sync::broadcast;
use tokio::time::interval;
use tracing::{error, info};

pub struct ReconciliationLoop {
    scheduler: Arc<SchedulerFacade<InMemoryCronEngine>>,
    execution_repo: Arc<ExecutionRepository>,
    check_interval_secs: u64,
    retention_check_interval_secs: u64,
    retention_days: i64,
    shutdown_tx: broadcast::Sender<()>,
}

impl ReconciliationLoop {
    #[must_use]
    pub fn new(
        scheduler: Arc<SchedulerFacade<InMemoryCronEngine>>,
        execution_repo: Arc<ExecutionRepository>,
        check_interval_secs: u64,
        retention_check_interval_secs: u64,
        retention_days: i64,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            scheduler,
            execution_repo,
            check_interval_secs,
            retention_check_interval_secs,
            retention_days,
            shutdown_tx,
        }
    }

    /// Runs until `stop()` is called. Intended to be spawned as its
    /// own task; `main` awaits the returned `JoinHandle`.
    pub async fn run(self: Arc<Self>) {
        info!(
            check_interval_secs = self.check_interval_secs,
            retention_check_interval_secs = self.retention_check_interval_secs,
            "starting reconciliation loop"
        );

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let mut check_interval = interval(Duration::from_secs(self.check_interval_secs));
        let mut retention_interval = interval(Duration::from_secs(self.retention_check_interval_secs));

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("reconciliation loop received shutdown signal");
                    break;
                }

                _ = check_interval.tick() => {
                    match self.scheduler.cleanup_orphans().await {
                        Ok(0) => {}
                        Ok(n) => info!(cleaned = n, "reconciliation: removed orphaned schedules"),
                        Err(e) => error!(error = %e, "reconciliation: orphan cleanup failed"),
                    }
                }

                _ = retention_interval.tick() => {
                    match self.execution_repo.cleanup_old(self.retention_days).await {
                        Ok(n) => info!(deleted = n, retention_days = self.retention_days, "retention: pruned execution history"),
                        Err(e) => error!(error = %e, "retention: cleanup failed"),
                    }
                }
            }
        }

        info!("reconciliation loop stopped");
    }

    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(());
    }
}
