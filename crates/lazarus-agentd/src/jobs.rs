//! Jobs every agent carries out of the box.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use lazarus_core::{Job, JobError, JobRouter};
use lazarus_model::Task;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Writes the task and its arguments to the log.
pub struct LogJob;

#[async_trait]
impl Job for LogJob {
    fn name(&self) -> &str {
        "log"
    }

    async fn run(&self, _ctx: CancellationToken, task: &Task) -> Result<(), JobError> {
        info!(task = %task.id, args = ?task.args, "log job");
        Ok(())
    }
}

/// Waits for `ms` milliseconds. Gives up early if the agent shuts down.
pub struct SleepJob;

#[async_trait]
impl Job for SleepJob {
    fn name(&self) -> &str {
        "sleep"
    }

    async fn run(&self, ctx: CancellationToken, task: &Task) -> Result<(), JobError> {
        let ms = match task.args.get("ms") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|e| JobError::Failed(format!("invalid ms {raw:?}: {e}")))?,
            None => 0,
        };
        tokio::select! {
            _ = ctx.cancelled() => Err(JobError::Cancelled),
            _ = tokio::time::sleep(Duration::from_millis(ms)) => Ok(()),
        }
    }
}

pub fn builtin_router() -> JobRouter {
    JobRouter::new()
        .with(Arc::new(LogJob))
        .with(Arc::new(SleepJob))
}
