use lazarus_model::Task;
use lazarus_store::SharedStore;
use tracing::debug;

use crate::{error::CoreError, topology::Topology};

/// Producer side of the global queues.
#[derive(Clone)]
pub struct TaskQueue {
    store: SharedStore,
    topology: Topology,
}

impl TaskQueue {
    pub fn new(store: SharedStore, topology: Topology) -> Self {
        Self { store, topology }
    }

    /// Enqueue a task for immediate execution.
    pub async fn submit(&self, task: &Task) -> Result<(), CoreError> {
        self.push(self.topology.pending_queue(), task).await
    }

    /// Enqueue a task that must not run before its execute time.
    pub async fn submit_deferred(&self, task: &Task) -> Result<(), CoreError> {
        self.push(self.topology.deferred_queue(), task).await
    }

    async fn push(&self, queue: &str, task: &Task) -> Result<(), CoreError> {
        let raw = task.encode()?;
        self.store
            .list_push(queue, &raw)
            .await
            .map_err(|source| CoreError::Submit {
                queue: queue.to_string(),
                source,
            })?;
        debug!(task = %task.id, job = %task.job_name, queue, "task submitted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lazarus_store::{MemoryStore, Store};

    use super::*;

    #[tokio::test]
    async fn submit_targets_the_right_queue() {
        let store = MemoryStore::new();
        let t = Topology::default();
        let queue = TaskQueue::new(Arc::new(store.clone()), t.clone());

        queue.submit(&Task::new("now").with_id("t1")).await.unwrap();
        queue
            .submit_deferred(&Task::new("later").with_id("t2").with_execute_time(5))
            .await
            .unwrap();

        let pending = store.list_range(t.pending_queue()).await.unwrap();
        let deferred = store.list_range(t.deferred_queue()).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(Task::decode(&pending[0]).unwrap().id.as_str(), "t1");
        assert_eq!(deferred.len(), 1);
        assert_eq!(Task::decode(&deferred[0]).unwrap().execute_time, Some(5));
    }
}
