//! Prometheus metrics backend for the lazarus reliable queue.
//!
//! [`PrometheusMetrics`] implements [`lazarus_core::MetricsBackend`] on a
//! private `prometheus::Registry`, so several instances can coexist in one
//! process (and in tests) without colliding in the global default registry.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use lazarus_prometheus::PrometheusMetrics;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let handle: lazarus_core::MetricsHandle = Arc::new(metrics.clone());
//! // cleaner.with_metrics(handle.clone()); worker.with_metrics(handle);
//! let body = metrics.render()?;
//! assert!(body.contains("lazarus_workers_reclaimed_total"));
//! # let _ = handle;
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `lazarus_sweeps_total{outcome}` - Counter
//! - `lazarus_workers_reclaimed_total` - Counter
//! - `lazarus_tasks_requeued_total{queue}` - Counter
//! - `lazarus_tasks_total{event}` - Counter
//!
//! Serving `/metrics` is left to the embedding binary.

mod backend;
pub use backend::PrometheusMetrics;
