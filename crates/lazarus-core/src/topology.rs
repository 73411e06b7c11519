//! Key naming for every queue role.
//!
//! Workers and the cleaner never talk to each other; they meet only on these
//! names, so both sides must derive them from the same [`Topology`].

use lazarus_model::WorkerId;

const DEFAULT_PREFIX: &str = "async";

/// Global queue a reclaimed task is returned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueRole {
    /// Global FIFO of tasks awaiting claim.
    Pending,
    /// Global FIFO of tasks waiting for their execute time.
    Deferred,
}

impl QueueRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueRole::Pending => "pending",
            QueueRole::Deferred => "deferred",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    prefix: String,
    worker_set: String,
    pending: String,
    deferred: String,
}

impl Topology {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            worker_set: format!("{prefix}:workers"),
            pending: format!("{prefix}:pending-tasks"),
            deferred: format!("{prefix}:deferred-tasks"),
            prefix,
        }
    }

    #[inline]
    pub fn worker_set(&self) -> &str {
        &self.worker_set
    }

    #[inline]
    pub fn pending_queue(&self) -> &str {
        &self.pending
    }

    #[inline]
    pub fn deferred_queue(&self) -> &str {
        &self.deferred
    }

    pub fn heartbeat_key(&self, worker: &WorkerId) -> String {
        format!("{}:heartbeats:{}", self.prefix, worker)
    }

    pub fn active_queue(&self, worker: &WorkerId) -> String {
        format!("{}:active-tasks:{}", self.prefix, worker)
    }

    pub fn watched_queue(&self, worker: &WorkerId) -> String {
        format!("{}:watched-tasks:{}", self.prefix, worker)
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_share_prefix() {
        let t = Topology::new("jobs");
        let w = WorkerId::from("w1");

        assert_eq!(t.worker_set(), "jobs:workers");
        assert_eq!(t.pending_queue(), "jobs:pending-tasks");
        assert_eq!(t.deferred_queue(), "jobs:deferred-tasks");
        assert_eq!(t.heartbeat_key(&w), "jobs:heartbeats:w1");
        assert_eq!(t.active_queue(&w), "jobs:active-tasks:w1");
        assert_eq!(t.watched_queue(&w), "jobs:watched-tasks:w1");
    }

    #[test]
    fn per_worker_names_are_disjoint() {
        let t = Topology::default();
        let a = WorkerId::from("a");
        let b = WorkerId::from("b");
        assert_ne!(t.active_queue(&a), t.active_queue(&b));
        assert_ne!(t.active_queue(&a), t.watched_queue(&a));
        assert_ne!(t.heartbeat_key(&a), t.heartbeat_key(&b));
    }
}
