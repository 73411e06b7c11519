//! Worker side of the reliable-queue protocol.
//!
//! A worker owns two lists: `active` holds tasks it is executing and
//! `watched` holds deferred tasks it waits on. Tasks only ever enter those
//! lists by an atomic move out of a global queue, and only ever leave them by
//! an atomic remove or move, so at every instant each task lives in exactly
//! one list. If the worker dies the cleaner moves both lists back.

mod claimed;
pub use claimed::ClaimedTask;

use std::{sync::Arc, time::Duration};

use lazarus_model::{Task, UnixMs, WorkerId, unix_ms};
use lazarus_store::{SharedStore, StoreError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::{
    config::{HeartbeatConfig, WorkerConfig},
    error::CoreError,
    heartbeat::Heartbeat,
    metrics::{MetricsHandle, TaskEvent, noop_metrics},
    queue::TaskQueue,
    router::{JobError, JobRouter},
    topology::Topology,
};

/// Result of one pass over the watched queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeferredScan {
    /// Tasks moved to pending during this pass.
    pub fired: usize,
    /// Tasks still waiting in the watched queue.
    pub waiting: usize,
    /// Earliest execute time among the waiting tasks.
    pub next_due: Option<UnixMs>,
}

pub struct Worker {
    id: WorkerId,
    store: SharedStore,
    topology: Topology,
    queue: TaskQueue,
    heartbeat: Heartbeat,
    router: Arc<JobRouter>,
    config: WorkerConfig,
    metrics: MetricsHandle,
}

impl Worker {
    pub fn new(
        id: WorkerId,
        store: SharedStore,
        topology: Topology,
        heartbeat: HeartbeatConfig,
        router: Arc<JobRouter>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            queue: TaskQueue::new(store.clone(), topology.clone()),
            heartbeat: Heartbeat::new(store.clone(), topology.clone(), heartbeat),
            id,
            store,
            topology,
            router,
            config,
            metrics: noop_metrics(),
        }
    }

    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    /// Write the first heartbeat and join the worker set.
    ///
    /// The key goes first, so the cleaner never sees this worker in the set
    /// without a live heartbeat.
    pub async fn register(&self) -> Result<(), CoreError> {
        self.heartbeat.beat(&self.id).await?;
        info!(worker = %self.id, "worker registered");
        Ok(())
    }

    pub async fn submit(&self, task: &Task) -> Result<(), CoreError> {
        self.queue.submit(task).await
    }

    pub async fn submit_deferred(&self, task: &Task) -> Result<(), CoreError> {
        self.queue.submit_deferred(task).await
    }

    /// Move the oldest pending task into this worker's active queue.
    pub async fn claim(&self) -> Result<Option<ClaimedTask>, CoreError> {
        let active = self.topology.active_queue(&self.id);
        let raw = self
            .store
            .pop_push(self.topology.pending_queue(), &active)
            .await
            .map_err(|e| self.queue_err(self.topology.pending_queue(), e))?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let claimed = self.decode_or_discard(&active, raw).await?;
        if claimed.is_some() {
            self.metrics.record_task(TaskEvent::Claimed);
        }
        Ok(claimed)
    }

    /// Remove a finished task from the active queue.
    ///
    /// Returns `false` if the payload was no longer there, which happens when
    /// the cleaner wrongly presumed this worker dead and moved it back.
    pub async fn complete(&self, claimed: &ClaimedTask) -> Result<bool, CoreError> {
        let active = self.topology.active_queue(&self.id);
        let removed = self
            .store
            .list_remove(&active, &claimed.raw)
            .await
            .map_err(|e| self.queue_err(&active, e))?;
        Ok(removed > 0)
    }

    /// Move the oldest deferred task into this worker's watched queue.
    pub async fn watch(&self) -> Result<Option<ClaimedTask>, CoreError> {
        let watched = self.topology.watched_queue(&self.id);
        let raw = self
            .store
            .pop_push(self.topology.deferred_queue(), &watched)
            .await
            .map_err(|e| self.queue_err(self.topology.deferred_queue(), e))?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let watched = self.decode_or_discard(&watched, raw).await?;
        if watched.is_some() {
            self.metrics.record_task(TaskEvent::Watched);
        }
        Ok(watched)
    }

    /// Move a watched task to pending in one atomic step.
    ///
    /// Nothing is pushed if the payload has already left the watched queue.
    pub async fn fire(&self, watched: &ClaimedTask) -> Result<bool, CoreError> {
        let queue = self.topology.watched_queue(&self.id);
        let moved = self
            .store
            .list_move(&queue, &watched.raw, self.topology.pending_queue())
            .await
            .map_err(|e| self.queue_err(&queue, e))?;
        if moved {
            self.metrics.record_task(TaskEvent::Fired);
            debug!(task = %watched.task.id, "deferred task fired");
        }
        Ok(moved)
    }

    /// Hand an unfinished task back to pending unchanged.
    pub async fn release(&self, claimed: &ClaimedTask) -> Result<bool, CoreError> {
        let active = self.topology.active_queue(&self.id);
        let moved = self
            .store
            .list_move(&active, &claimed.raw, self.topology.pending_queue())
            .await
            .map_err(|e| self.queue_err(&active, e))?;
        if moved {
            self.metrics.record_task(TaskEvent::Released);
        }
        Ok(moved)
    }

    /// Refuse a task this worker has no job for.
    ///
    /// The rejection count is bumped and the task goes back to pending in the
    /// same atomic step that removes it from active. A task refused more than
    /// `max_rejections` times is dropped.
    pub async fn reject(&self, claimed: &ClaimedTask) -> Result<bool, CoreError> {
        let active = self.topology.active_queue(&self.id);
        let mut task = claimed.task.clone();
        task.worker_rejection_count = task.worker_rejection_count.saturating_add(1);
        self.metrics.record_task(TaskEvent::Rejected);

        if task.worker_rejection_count > self.config.max_rejections {
            error!(
                task = %task.id,
                job = %task.job_name,
                rejections = task.worker_rejection_count,
                "no worker accepts task; discarding"
            );
            self.complete(claimed).await?;
            return Ok(false);
        }

        let replacement = task.encode()?;
        let moved = self
            .store
            .list_transfer(&active, &claimed.raw, self.topology.pending_queue(), &replacement)
            .await
            .map_err(|e| self.queue_err(&active, e))?;
        warn!(
            task = %task.id,
            job = %task.job_name,
            rejections = task.worker_rejection_count,
            "no job registered for task; returned to pending"
        );
        Ok(moved)
    }

    /// Fire every watched task that is due at `now`, then top the watched
    /// queue up from deferred.
    ///
    /// At `max_watched` the latest-due watched task is handed back to the head
    /// of the deferred queue, once per pass, to make room for the task at the
    /// deferred tail. A watched queue full of far-future tasks therefore never
    /// hides a due task queued behind it.
    pub async fn fire_due(&self, now: UnixMs) -> Result<DeferredScan, CoreError> {
        let queue = self.topology.watched_queue(&self.id);
        let mut scan = DeferredScan::default();
        let mut waiting = Vec::new();

        for raw in self
            .store
            .list_range(&queue)
            .await
            .map_err(|e| self.queue_err(&queue, e))?
        {
            if let Some(watched) = self.decode_or_discard(&queue, raw).await? {
                self.settle(now, watched, &mut scan, &mut waiting).await?;
            }
        }

        let mut rotated = false;
        loop {
            if waiting.len() >= self.config.max_watched {
                if rotated || !self.rotate(&mut waiting).await? {
                    break;
                }
                rotated = true;
            }
            let Some(watched) = self.watch().await? else {
                break;
            };
            self.settle(now, watched, &mut scan, &mut waiting).await?;
        }

        scan.waiting = waiting.len();
        scan.next_due = waiting.iter().filter_map(|w| w.task.execute_time).min();
        Ok(scan)
    }

    async fn settle(
        &self,
        now: UnixMs,
        watched: ClaimedTask,
        scan: &mut DeferredScan,
        waiting: &mut Vec<ClaimedTask>,
    ) -> Result<(), CoreError> {
        if !watched.task.is_due(now) {
            waiting.push(watched);
        } else if self.fire(&watched).await? {
            scan.fired += 1;
        }
        Ok(())
    }

    /// Give the latest-due waiting task back to the deferred queue. Returns
    /// `false` when there was nothing to give back.
    async fn rotate(&self, waiting: &mut Vec<ClaimedTask>) -> Result<bool, CoreError> {
        let Some(latest) = waiting
            .iter()
            .enumerate()
            .max_by_key(|(_, w)| w.task.execute_time)
            .map(|(i, _)| i)
        else {
            return Ok(false);
        };
        let latest = waiting.swap_remove(latest);
        let queue = self.topology.watched_queue(&self.id);
        // A `false` here means the payload already left the watched queue,
        // which frees the slot just the same.
        self.store
            .list_move(&queue, &latest.raw, self.topology.deferred_queue())
            .await
            .map_err(|e| self.queue_err(&queue, e))?;
        trace!(task = %latest.task.id, "watched task handed back to deferred");
        Ok(true)
    }

    /// Claim and execute pending tasks until the queue is empty or `ctx` fires.
    pub async fn process_pending(&self, ctx: &CancellationToken) -> Result<usize, CoreError> {
        let mut processed = 0;
        while !ctx.is_cancelled() {
            let Some(claimed) = self.claim().await? else {
                break;
            };
            let event = self.execute(ctx, claimed).await?;
            processed += 1;
            // Leave a rejected task for workers that know its job.
            if event == TaskEvent::Rejected {
                break;
            }
        }
        Ok(processed)
    }

    #[instrument(level = "debug", skip(self, ctx, claimed), fields(task = %claimed.task.id, job = %claimed.task.job_name))]
    async fn execute(
        &self,
        ctx: &CancellationToken,
        claimed: ClaimedTask,
    ) -> Result<TaskEvent, CoreError> {
        let event = match self.router.dispatch(ctx.child_token(), &claimed.task).await {
            None => {
                self.reject(&claimed).await?;
                TaskEvent::Rejected
            }
            Some(Ok(())) => {
                self.complete(&claimed).await?;
                self.metrics.record_task(TaskEvent::Completed);
                trace!("task completed");
                TaskEvent::Completed
            }
            Some(Err(JobError::Cancelled)) if ctx.is_cancelled() => {
                self.release(&claimed).await?;
                info!("task interrupted by shutdown; returned to pending");
                TaskEvent::Released
            }
            Some(Err(e)) => {
                self.complete(&claimed).await?;
                self.metrics.record_task(TaskEvent::Failed);
                warn!(error = %e, "task failed");
                TaskEvent::Failed
            }
        };
        Ok(event)
    }

    /// Register, then serve both queues until `ctx` is cancelled.
    ///
    /// The heartbeat runs as its own task on a child token so that a slow job
    /// never delays renewal. Errors from a single poll are logged and the poll
    /// retried; only a failed registration ends the loop early.
    pub async fn run(&self, ctx: CancellationToken) -> Result<(), CoreError> {
        self.register().await?;

        let beat_ctx = ctx.child_token();
        let beat = tokio::spawn({
            let heartbeat = self.heartbeat.clone();
            let ctx = beat_ctx.clone();
            let id = self.id.clone();
            async move { heartbeat.run(ctx, id).await }
        });

        info!(
            worker = %self.id,
            jobs = ?self.router.names(),
            poll_ms = self.config.poll_interval.as_millis() as u64,
            "worker started"
        );

        while !ctx.is_cancelled() {
            let pause = match self.poll(&ctx).await {
                Ok(pause) => pause,
                Err(e) => {
                    error!(worker = %self.id, error = %e, "worker poll failed");
                    self.config.poll_interval
                }
            };
            tokio::select! {
                _ = ctx.cancelled() => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        if let Err(e) = self.return_watched().await {
            error!(worker = %self.id, error = %e, "failed to return watched tasks");
        }
        beat_ctx.cancel();
        if let Err(e) = beat.await {
            warn!(worker = %self.id, error = %e, "heartbeat task ended abnormally");
        }
        info!(worker = %self.id, "worker stopped");
        Ok(())
    }

    /// One poll: fire due deferred tasks, then drain pending. Returns how long
    /// to sleep before the next poll.
    async fn poll(&self, ctx: &CancellationToken) -> Result<Duration, CoreError> {
        let scan = self.fire_due(unix_ms()).await?;
        let processed = self.process_pending(ctx).await?;
        if scan.fired > 0 || processed > 0 {
            debug!(fired = scan.fired, processed, waiting = scan.waiting, "worker poll");
        }

        let pause = match scan.next_due {
            Some(due) => Duration::from_millis(due.saturating_sub(unix_ms()))
                .min(self.config.poll_interval),
            None => self.config.poll_interval,
        };
        Ok(pause)
    }

    /// Give every watched task back to the deferred queue.
    async fn return_watched(&self) -> Result<usize, CoreError> {
        let watched = self.topology.watched_queue(&self.id);
        let mut returned = 0;
        while self
            .store
            .pop_push(&watched, self.topology.deferred_queue())
            .await
            .map_err(|e| self.queue_err(&watched, e))?
            .is_some()
        {
            returned += 1;
        }
        if returned > 0 {
            info!(worker = %self.id, returned, "watched tasks returned to deferred");
        }
        Ok(returned)
    }

    /// Decode a payload that now sits in `queue`. Undecodable payloads are
    /// removed, since no worker could ever process them.
    async fn decode_or_discard(
        &self,
        queue: &str,
        raw: String,
    ) -> Result<Option<ClaimedTask>, CoreError> {
        match Task::decode(&raw) {
            Ok(task) => Ok(Some(ClaimedTask::new(raw, task))),
            Err(e) => {
                error!(worker = %self.id, queue, error = %e, payload = %raw, "undecodable task discarded");
                self.store
                    .list_remove(queue, &raw)
                    .await
                    .map_err(|e| self.queue_err(queue, e))?;
                self.metrics.record_task(TaskEvent::Failed);
                Ok(None)
            }
        }
    }

    fn queue_err(&self, queue: &str, source: StoreError) -> CoreError {
        CoreError::Queue {
            worker: self.id.clone(),
            queue: queue.to_string(),
            source,
        }
    }
}
