//! Run-forever loop driving reconciliation passes.

use std::time::Duration;

use tokio::task::JoinHandle;

use crate::cluster::ClusterApi;
use crate::namespaces::NamespaceScope;
use crate::reconciler::engine::GenericReconciler;
use crate::shutdown::Shutdown;
use crate::validation::Evaluator;

/// Runs passes back to back, waiting at least `interval` between them.
pub struct PassScheduler<C, N, E> {
    reconciler: GenericReconciler<C, N, E>,
    interval: Duration,
    shutdown: Shutdown,
}

impl<C, N, E> PassScheduler<C, N, E>
where
    C: ClusterApi + 'static,
    N: NamespaceScope + 'static,
    E: Evaluator + 'static,
{
    /// Creates a scheduler using the reconciler's configured pass interval.
    pub fn new(reconciler: GenericReconciler<C, N, E>, shutdown: Shutdown) -> Self {
        let interval = reconciler.config().pass_interval;
        Self {
            reconciler,
            interval,
            shutdown,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Returns a handle that stops the loop when triggered.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Loops until shutdown, then hands the reconciler back.
    ///
    /// A failed pass is logged and retried on the next iteration; nothing
    /// short of shutdown ends the loop.
    pub async fn run(mut self) -> GenericReconciler<C, N, E> {
        log::info!(
            "Starting reconciliation loop (minimum interval {:?})",
            self.interval
        );

        loop {
            if self.shutdown.is_triggered() {
                break;
            }

            match self.reconciler.reconcile_everything(&self.shutdown).await {
                Ok(report) if report.deletions > 0 => {
                    log::info!(
                        "Pass {}: reclaimed {} deleted objects",
                        report.pass,
                        report.deletions
                    );
                }
                Ok(_) => {}
                Err(e) if e.is_cancelled() => {
                    log::info!("Reconciliation pass cancelled");
                    break;
                }
                Err(e) => log::error!("Error fetching and validating resource types: {}", e),
            }

            if !self.shutdown.sleep(self.interval).await {
                break;
            }
        }

        log::info!("Reconciliation loop stopped");
        self.reconciler
    }

    /// Spawns [`run`](Self::run) on the current tokio runtime.
    pub fn start(self) -> JoinHandle<GenericReconciler<C, N, E>> {
        tokio::spawn(self.run())
    }
}
