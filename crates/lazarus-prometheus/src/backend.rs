use lazarus_core::{MetricsBackend, QueueRole, SweepOutcome, TaskEvent};
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    sweeps: IntCounterVec,
    reclaimed: IntCounter,
    requeued: IntCounterVec,
    tasks: IntCounterVec,
}

impl PrometheusMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let sweeps = IntCounterVec::new(
            Opts::new("lazarus_sweeps_total", "Cleaner sweeps by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(sweeps.clone()))?;

        let reclaimed = IntCounter::new(
            "lazarus_workers_reclaimed_total",
            "Dead workers whose queues were returned",
        )?;
        registry.register(Box::new(reclaimed.clone()))?;

        let requeued = IntCounterVec::new(
            Opts::new(
                "lazarus_tasks_requeued_total",
                "Tasks moved back to a global queue after their worker died",
            ),
            &["queue"],
        )?;
        registry.register(Box::new(requeued.clone()))?;

        let tasks = IntCounterVec::new(
            Opts::new("lazarus_tasks_total", "Worker task transitions by event"),
            &["event"],
        )?;
        registry.register(Box::new(tasks.clone()))?;

        Ok(Self {
            registry,
            sweeps,
            reclaimed,
            requeued,
            tasks,
        })
    }

    /// Text exposition format, ready to serve from `/metrics`.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_sweep(&self, outcome: SweepOutcome) {
        self.sweeps.with_label_values(&[outcome.as_label()]).inc();
    }

    fn record_worker_reclaimed(&self) {
        self.reclaimed.inc();
    }

    fn record_requeued(&self, role: QueueRole, count: usize) {
        if count == 0 {
            return;
        }
        self.requeued
            .with_label_values(&[role.as_str()])
            .inc_by(count as u64);
    }

    fn record_task(&self, event: TaskEvent) {
        self.tasks.with_label_values(&[event.as_label()]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_exposition() {
        let m = PrometheusMetrics::new().unwrap();
        m.record_sweep(SweepOutcome::Completed);
        m.record_sweep(SweepOutcome::Completed);
        m.record_worker_reclaimed();
        m.record_requeued(QueueRole::Pending, 3);
        m.record_requeued(QueueRole::Deferred, 0);
        m.record_task(TaskEvent::Claimed);

        let text = m.render().unwrap();
        assert!(text.contains(r#"lazarus_sweeps_total{outcome="completed"} 2"#));
        assert!(text.contains("lazarus_workers_reclaimed_total 1"));
        assert!(text.contains(r#"lazarus_tasks_requeued_total{queue="pending"} 3"#));
        assert!(!text.contains(r#"queue="deferred""#));
        assert!(text.contains(r#"lazarus_tasks_total{event="claimed"} 1"#));
    }

    #[test]
    fn instances_do_not_share_state() {
        let a = PrometheusMetrics::new().unwrap();
        let b = PrometheusMetrics::new().unwrap();
        a.record_worker_reclaimed();
        assert!(b.render().unwrap().contains("lazarus_workers_reclaimed_total 0"));
    }
}
