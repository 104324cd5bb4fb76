use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::application::{
    cleanup::{CleanupReport, CleanupService},
    error::ApplicationError,
};

/// Runs cleanup passes on a fixed interval, never two at once.
pub struct CleanupScheduler {
    service: Arc<CleanupService>,
    interval: Duration,
    in_progress: AtomicBool,
}

/// Clears the in-progress flag when the pass ends, even if it panicked.
struct PassGuard<'a>(&'a AtomicBool);

impl<'a> PassGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PassGuard(flag))
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl CleanupScheduler {
    pub fn new(service: Arc<CleanupService>, interval: Duration) -> Self {
        Self {
            service,
            interval,
            in_progress: AtomicBool::new(false),
        }
    }

    /// Runs a single pass. Returns `None` without doing anything when a pass is
    /// already in progress.
    pub async fn run_once(&self) -> Option<Result<CleanupReport, ApplicationError>> {
        let Some(_guard) = PassGuard::acquire(&self.in_progress) else {
            info!("Previous cleanup pass still running, skipping this tick");
            return None;
        };

        let result = self.service.run_pass().await;
        if let Err(ref e) = result {
            error!("Cleanup pass failed: {}", e);
        }
        Some(result)
    }

    /// Starts the background loop. The first pass runs immediately.
    ///
    /// Each pass runs on its own task so the ticker keeps its cadence; a tick that
    /// lands while a pass is still running is dropped.
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let scheduler = Arc::new(self);

        let task = tokio::spawn(async move {
            info!(
                "Cleanup scheduler started, interval {}s",
                scheduler.interval.as_secs_f64()
            );
            let mut ticker = tokio::time::interval(scheduler.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let scheduler = Arc::clone(&scheduler);
                        tokio::spawn(async move {
                            scheduler.run_once().await;
                        });
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
            info!("Cleanup scheduler stopped");
        });

        SchedulerHandle { shutdown_tx, task }
    }
}

pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stops scheduling new passes. A pass already running is left to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            error!("Cleanup scheduler task ended abnormally: {}", e);
        }
    }
}
