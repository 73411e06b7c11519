use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use lazarus_model::Task;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{instrument, trace};

#[derive(Debug, Error)]
pub enum JobError {
    #[error("job failed: {0}")]
    Failed(String),
    /// The job observed cancellation and stopped before finishing.
    #[error("job cancelled")]
    Cancelled,
}

/// Business logic bound to a job name.
///
/// A job may be executed more than once for the same task: after a worker
/// crash the task returns to the pending queue and runs again elsewhere.
#[async_trait]
pub trait Job: Send + Sync + 'static {
    fn name(&self) -> &str;

    async fn run(&self, ctx: CancellationToken, task: &Task) -> Result<(), JobError>;
}

/// Dispatch table from job name to [`Job`].
#[derive(Default, Clone)]
pub struct JobRouter {
    jobs: HashMap<String, Arc<dyn Job>>,
}

impl JobRouter {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job; a later registration under the same name wins.
    #[inline]
    pub fn register(&mut self, job: Arc<dyn Job>) {
        trace!(job = job.name(), "job registered");
        self.jobs.insert(job.name().to_string(), job);
    }

    #[inline]
    pub fn with(mut self, job: Arc<dyn Job>) -> Self {
        self.register(job);
        self
    }

    pub fn pick(&self, task: &Task) -> Option<&Arc<dyn Job>> {
        self.jobs.get(&task.job_name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.jobs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Run the job matching `task`. `None` when no job is registered.
    #[instrument(level = "trace", skip(self, ctx, task), fields(task = %task.id, job = %task.job_name))]
    pub async fn dispatch(
        &self,
        ctx: CancellationToken,
        task: &Task,
    ) -> Option<Result<(), JobError>> {
        let job = self.pick(task)?;
        Some(job.run(ctx, task).await)
    }
}
