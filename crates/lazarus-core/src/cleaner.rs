//! Dead-worker reclaim.
//!
//! A sweep enumerates the worker set, and for every worker whose heartbeat
//! key has decayed moves the contents of its active queue back to the pending
//! queue and of its watched queue back to the deferred queue, one element per
//! atomic store call. Only then is the worker dropped from the set, so a sweep
//! that fails or is cancelled half way leaves the worker discoverable and the
//! next sweep picks up where this one stopped.

use lazarus_model::WorkerId;
use lazarus_store::SharedStore;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace};

use crate::{
    config::CleanerConfig,
    error::CoreError,
    metrics::{MetricsHandle, SweepOutcome, noop_metrics},
    topology::{QueueRole, Topology},
};

/// Counters of a finished sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Workers found in the set snapshot.
    pub workers_checked: usize,
    /// Dead workers whose queues were drained and who left the set.
    pub workers_reclaimed: usize,
    /// Tasks moved from active queues to the pending queue.
    pub requeued_pending: usize,
    /// Tasks moved from watched queues to the deferred queue.
    pub requeued_deferred: usize,
}

impl SweepReport {
    pub fn requeued(&self) -> usize {
        self.requeued_pending + self.requeued_deferred
    }
}

pub struct Cleaner {
    store: SharedStore,
    topology: Topology,
    config: CleanerConfig,
    metrics: MetricsHandle,
}

impl Cleaner {
    pub fn new(store: SharedStore, topology: Topology, config: CleanerConfig) -> Self {
        Self {
            store,
            topology,
            config,
            metrics: noop_metrics(),
        }
    }

    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    /// One sweep over the global queues of this cleaner's topology.
    pub async fn sweep(&self, ctx: &CancellationToken) -> Result<SweepReport, CoreError> {
        let outcome = self
            .clean(
                ctx,
                self.topology.worker_set(),
                self.topology.pending_queue(),
                self.topology.deferred_queue(),
            )
            .await;
        self.metrics.record_sweep(match &outcome {
            Ok(_) => SweepOutcome::Completed,
            Err(e) if e.is_cancelled() => SweepOutcome::Cancelled,
            Err(_) => SweepOutcome::Failed,
        });
        outcome
    }

    /// Reclaim the queues of every dead worker listed in `worker_set`.
    ///
    /// Per-worker key names come from the topology; the global names are
    /// explicit so that several logical engines can share one prefix scheme.
    /// A store fault while checking a heartbeat aborts the sweep: an
    /// unreadable key is not evidence of death.
    #[instrument(level = "debug", skip(self, ctx))]
    pub async fn clean(
        &self,
        ctx: &CancellationToken,
        worker_set: &str,
        pending_queue: &str,
        deferred_queue: &str,
    ) -> Result<SweepReport, CoreError> {
        if ctx.is_cancelled() {
            return Err(CoreError::Cancelled);
        }
        let workers = self
            .store
            .set_members(worker_set)
            .await
            .map_err(|source| CoreError::ListWorkers {
                set: worker_set.to_string(),
                source,
            })?;

        let mut report = SweepReport {
            workers_checked: workers.len(),
            ..Default::default()
        };

        for worker in workers.into_iter().map(WorkerId::from) {
            let reclaimed = self
                .reclaim(ctx, &worker, worker_set, pending_queue, deferred_queue)
                .await?;
            if let Some((active, watched)) = reclaimed {
                report.workers_reclaimed += 1;
                report.requeued_pending += active;
                report.requeued_deferred += watched;
            }

            if ctx.is_cancelled() {
                debug!(%worker, "context cancelled; cleaner sweep stopping");
                return Err(CoreError::Cancelled);
            }
        }

        Ok(report)
    }

    /// Drain one worker if its heartbeat has decayed, then drop it from
    /// `worker_set`. Returns the number of tasks moved out of its active and
    /// watched queues, or `None` for a live worker.
    async fn reclaim(
        &self,
        ctx: &CancellationToken,
        worker: &WorkerId,
        worker_set: &str,
        pending_queue: &str,
        deferred_queue: &str,
    ) -> Result<Option<(usize, usize)>, CoreError> {
        let alive = self
            .store
            .key_exists(&self.topology.heartbeat_key(worker))
            .await
            .map_err(|source| CoreError::CheckHeartbeat {
                worker: worker.clone(),
                source,
            })?;
        if alive {
            trace!(%worker, "worker alive");
            return Ok(None);
        }

        let active = self
            .drain_queue(ctx, worker, &self.topology.active_queue(worker), pending_queue)
            .await?;
        self.metrics.record_requeued(QueueRole::Pending, active);

        let watched = self
            .drain_queue(ctx, worker, &self.topology.watched_queue(worker), deferred_queue)
            .await?;
        self.metrics.record_requeued(QueueRole::Deferred, watched);

        self.store
            .set_remove(worker_set, worker.as_str())
            .await
            .map_err(|source| CoreError::RemoveWorker {
                worker: worker.clone(),
                source,
            })?;
        self.metrics.record_worker_reclaimed();

        info!(
            %worker,
            requeued_pending = active,
            requeued_deferred = watched,
            "reclaimed dead worker"
        );
        Ok(Some((active, watched)))
    }

    /// Move every element of `source` to `destination`, one atomic
    /// pop-and-push at a time, returning how many were moved.
    ///
    /// Cancellation is checked before each move. Whatever is left in
    /// `source` after an error or cancellation is still owned by `worker` and
    /// will be found by a later sweep.
    pub async fn drain_queue(
        &self,
        ctx: &CancellationToken,
        worker: &WorkerId,
        source: &str,
        destination: &str,
    ) -> Result<usize, CoreError> {
        let mut moved = 0;
        loop {
            if ctx.is_cancelled() {
                return Err(CoreError::Cancelled);
            }
            let task = self
                .store
                .pop_push(source, destination)
                .await
                .map_err(|e| CoreError::Drain {
                    worker: worker.clone(),
                    queue: source.to_string(),
                    source: e,
                })?;
            match task {
                Some(_) => moved += 1,
                None => return Ok(moved),
            }
        }
    }

    /// Sweep every `interval` until `ctx` is cancelled.
    ///
    /// A failed sweep is logged and retried on the next tick; the store is the
    /// only state, so nothing needs to be carried between sweeps.
    pub async fn run(&self, ctx: CancellationToken) {
        let mut tick = interval(self.config.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            interval_ms = self.config.interval.as_millis() as u64,
            worker_set = self.topology.worker_set(),
            "dead worker cleaner started"
        );

        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    info!("dead worker cleaner shutting down");
                    return;
                }
                _ = tick.tick() => {
                    match self.sweep(&ctx).await {
                        Ok(report) => debug!(
                            workers = report.workers_checked,
                            reclaimed = report.workers_reclaimed,
                            requeued = report.requeued(),
                            "cleaner sweep finished"
                        ),
                        Err(CoreError::Cancelled) => {
                            info!("dead worker cleaner shutting down");
                            return;
                        }
                        Err(e) => error!(error = %e, "cleaner sweep failed"),
                    }
                }
            }
        }
    }
}
