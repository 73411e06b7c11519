pub mod cleaner;
pub use cleaner::{Cleaner, SweepReport};
pub mod config;
pub use config::{CleanerConfig, ConfigError, HeartbeatConfig, WorkerConfig};
pub mod error;
pub use error::CoreError;
pub mod heartbeat;
pub use heartbeat::Heartbeat;
pub mod metrics;
pub use metrics::{MetricsBackend, MetricsHandle, NoopMetrics, SweepOutcome, TaskEvent};
pub mod queue;
pub use queue::TaskQueue;
pub mod router;
pub use router::{Job, JobError, JobRouter};
pub mod system;
pub use system::default_worker_id;
pub mod topology;
pub use topology::{QueueRole, Topology};
pub mod worker;
pub use worker::{ClaimedTask, DeferredScan, Worker};

#[cfg(test)]
mod testing;
