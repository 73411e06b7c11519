use lazarus_model::{TaskCodecError, WorkerId};
use lazarus_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// The caller's cancellation token fired. Distinct from every store fault.
    #[error("operation cancelled")]
    Cancelled,

    #[error("error retrieving workers from \"{set}\": {source}")]
    ListWorkers { set: String, source: StoreError },

    #[error("error checking health of worker \"{worker}\": {source}")]
    CheckHeartbeat { worker: WorkerId, source: StoreError },

    #[error("error cleaning up after dead worker \"{worker}\" queue \"{queue}\": {source}")]
    Drain {
        worker: WorkerId,
        queue: String,
        source: StoreError,
    },

    #[error("error removing dead worker \"{worker}\" from worker set: {source}")]
    RemoveWorker { worker: WorkerId, source: StoreError },

    #[error("error renewing heartbeat of worker \"{worker}\": {source}")]
    Heartbeat { worker: WorkerId, source: StoreError },

    #[error("worker \"{worker}\" failed on queue \"{queue}\": {source}")]
    Queue {
        worker: WorkerId,
        queue: String,
        source: StoreError,
    },

    #[error("error submitting to queue \"{queue}\": {source}")]
    Submit { queue: String, source: StoreError },

    #[error(transparent)]
    Codec(#[from] TaskCodecError),
}

impl CoreError {
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CoreError::Cancelled)
    }
}
