use std::sync::Arc;

use crate::topology::QueueRole;

/// How a sweep ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    Completed,
    Cancelled,
    Failed,
}

impl SweepOutcome {
    pub fn as_label(&self) -> &'static str {
        match self {
            SweepOutcome::Completed => "completed",
            SweepOutcome::Cancelled => "cancelled",
            SweepOutcome::Failed => "failed",
        }
    }
}

/// Lifecycle step of a task as seen by a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEvent {
    Claimed,
    Completed,
    Failed,
    Rejected,
    Released,
    Watched,
    Fired,
}

impl TaskEvent {
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskEvent::Claimed => "claimed",
            TaskEvent::Completed => "completed",
            TaskEvent::Failed => "failed",
            TaskEvent::Rejected => "rejected",
            TaskEvent::Released => "released",
            TaskEvent::Watched => "watched",
            TaskEvent::Fired => "fired",
        }
    }
}

/// Sink for protocol counters.
///
/// Implementations must be cheap; they are called inline on the hot path.
pub trait MetricsBackend: Send + Sync + 'static {
    fn record_sweep(&self, outcome: SweepOutcome);
    fn record_worker_reclaimed(&self);
    /// `count` tasks were returned to the global queue of `role`.
    fn record_requeued(&self, role: QueueRole, count: usize);
    fn record_task(&self, event: TaskEvent);
}

pub type MetricsHandle = Arc<dyn MetricsBackend>;

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsBackend for NoopMetrics {
    fn record_sweep(&self, _outcome: SweepOutcome) {}
    fn record_worker_reclaimed(&self) {}
    fn record_requeued(&self, _role: QueueRole, _count: usize) {}
    fn record_task(&self, _event: TaskEvent) {}
}

pub fn noop_metrics() -> MetricsHandle {
    Arc::new(NoopMetrics)
}
