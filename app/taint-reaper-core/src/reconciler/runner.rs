use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::{sync::watch::Receiver, time::Instant};

use crate::kubernetes::NodeStore;

use super::{
    config::ReconcilerConfig, error::ReconcilerError, report::ReconcileReport, TaintReconciler,
};

pub enum LoopCommand {
    Continue,
    Break,
}

/// Drives a [`TaintReconciler`]: one pass right away, then another after every
/// requeue interval or refresh signal, until shutdown is requested.
///
/// Passes never overlap. Refresh signals arriving during a pass are coalesced into
/// a single follow-up pass, which starts no sooner than `min_refresh_interval`
/// after the previous one.
pub struct ReconcileLoop<S> {
    reconciler: TaintReconciler<S>,
    refresh_signal: Receiver<()>,
    refresh_open: bool,
    shutdown: Receiver<bool>,
    last_pass: Instant,
}

impl<S: NodeStore> ReconcileLoop<S> {
    pub fn new(
        reconciler: TaintReconciler<S>,
        refresh_signal: Receiver<()>,
        shutdown: Receiver<bool>,
    ) -> Self {
        Self {
            reconciler,
            refresh_signal,
            refresh_open: true,
            shutdown,
            last_pass: Instant::now(),
        }
    }

    pub async fn start(&mut self) {
        info!("Starting unregistered taint reconciliation...");

        loop {
            self.last_pass = Instant::now();

            let delay = tokio::select! {
                result = self.reconciler.reconcile() => requeue_after(self.reconciler.config(), result),
                _ = shutdown_requested(&mut self.shutdown) => break,
            };

            if let LoopCommand::Break = self.wait_for_trigger(delay).await {
                break;
            }
        }

        info!("Exiting unregistered taint reconciliation...");
    }

    async fn wait_for_trigger(&mut self, delay: Duration) -> LoopCommand {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        let earliest_refresh = self.last_pass + self.reconciler.config().min_refresh_interval;

        loop {
            tokio::select! {
                _ = &mut sleep => return LoopCommand::Continue,
                changed = self.refresh_signal.changed(), if self.refresh_open => match changed {
                    Ok(_) if earliest_refresh <= Instant::now() => return LoopCommand::Continue,
                    Ok(_) => {
                        if earliest_refresh < sleep.deadline() {
                            debug!("Refresh requested, deferring the pass until the minimum interval has passed...");
                            sleep.as_mut().reset(earliest_refresh);
                        }
                    }
                    Err(_) => {
                        warn!("Refresh signal source is gone, falling back to periodic passes only!");
                        self.refresh_open = false;
                    }
                },
                _ = shutdown_requested(&mut self.shutdown) => return LoopCommand::Break,
            }
        }
    }
}

fn requeue_after(
    config: &ReconcilerConfig,
    result: Result<ReconcileReport, ReconcilerError>,
) -> Duration {
    match result {
        Ok(report) => {
            if report.has_failures() {
                warn!("Reconciliation pass finished with failures: {report}");
            } else {
                info!("Reconciliation pass finished: {report}");
            }

            config.requeue_interval
        }
        Err(err) => {
            error!("Reconciliation pass failed! {err}");

            config.error_requeue_interval
        }
    }
}

/// Resolves once `true` is sent or every sender is dropped.
async fn shutdown_requested(shutdown: &mut Receiver<bool>) {
    loop {
        let requested = *shutdown.borrow_and_update();

        if requested || shutdown.changed().await.is_err() {
            return;
        }
    }
}
