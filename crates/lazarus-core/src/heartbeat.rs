//! Worker liveness.
//!
//! A worker is alive exactly as long as its heartbeat key exists. The key is
//! written with a TTL and nobody ever deletes it: a dead worker simply stops
//! renewing and the key decays on its own.

use lazarus_model::{WorkerId, unix_ms};
use lazarus_store::SharedStore;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace, warn};

use crate::{config::HeartbeatConfig, error::CoreError, topology::Topology};

#[derive(Clone)]
pub struct Heartbeat {
    store: SharedStore,
    topology: Topology,
    config: HeartbeatConfig,
}

impl Heartbeat {
    pub fn new(store: SharedStore, topology: Topology, config: HeartbeatConfig) -> Self {
        Self {
            store,
            topology,
            config,
        }
    }

    /// Write or refresh the liveness key of `worker`.
    pub async fn renew(&self, worker: &WorkerId) -> Result<(), CoreError> {
        let key = self.topology.heartbeat_key(worker);
        let stamp = unix_ms().to_string();
        self.store
            .set_with_ttl(&key, stamp.as_bytes(), self.config.ttl)
            .await
            .map_err(|source| CoreError::Heartbeat {
                worker: worker.clone(),
                source,
            })?;
        trace!(%worker, ttl_ms = self.config.ttl.as_millis() as u64, "heartbeat renewed");
        Ok(())
    }

    /// Renew the key and make sure the worker is enumerable by the cleaner.
    ///
    /// Re-adding on every beat covers a worker that was presumed dead during
    /// a long store outage and removed from the set while still running.
    pub async fn beat(&self, worker: &WorkerId) -> Result<(), CoreError> {
        self.renew(worker).await?;
        self.store
            .set_add(self.topology.worker_set(), worker.as_str())
            .await
            .map_err(|source| CoreError::Heartbeat {
                worker: worker.clone(),
                source,
            })
    }

    /// Beat every `interval` until `ctx` is cancelled.
    ///
    /// Failures are logged and retried on the next tick; the TTL margin
    /// absorbs a missed renewal.
    #[instrument(level = "debug", skip(self, ctx, worker), fields(worker = %worker))]
    pub async fn run(&self, ctx: CancellationToken, worker: WorkerId) {
        let mut tick = interval(self.config.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!(
            interval_ms = self.config.interval.as_millis() as u64,
            ttl_ms = self.config.ttl.as_millis() as u64,
            "heartbeat started"
        );

        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    debug!("heartbeat stopped");
                    return;
                }
                _ = tick.tick() => {
                    if let Err(e) = self.beat(&worker).await {
                        warn!(error = %e, "heartbeat failed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use lazarus_store::{MemoryStore, Store};

    use super::*;

    fn heartbeat(store: &MemoryStore) -> Heartbeat {
        Heartbeat::new(
            Arc::new(store.clone()),
            Topology::default(),
            HeartbeatConfig {
                interval: Duration::from_secs(1),
                ttl: Duration::from_secs(3),
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn renewed_key_expires_without_renewal() {
        let store = MemoryStore::new();
        let hb = heartbeat(&store);
        let w = WorkerId::from("w1");
        let key = Topology::default().heartbeat_key(&w);

        hb.renew(&w).await.unwrap();
        assert!(store.key_exists(&key).await.unwrap());

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(!store.key_exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn beat_registers_worker() {
        let store = MemoryStore::new();
        let hb = heartbeat(&store);
        let w = WorkerId::from("w1");

        hb.beat(&w).await.unwrap();
        let members = store
            .set_members(Topology::default().worker_set())
            .await
            .unwrap();
        assert_eq!(members, vec!["w1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn run_keeps_key_alive_until_cancelled() {
        let store = MemoryStore::new();
        let hb = heartbeat(&store);
        let w = WorkerId::from("w1");
        let key = Topology::default().heartbeat_key(&w);

        let ctx = CancellationToken::new();
        let handle = tokio::spawn({
            let hb = hb.clone();
            let ctx = ctx.clone();
            let w = w.clone();
            async move { hb.run(ctx, w).await }
        });

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(store.key_exists(&key).await.unwrap());

        ctx.cancel();
        handle.await.unwrap();

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(!store.key_exists(&key).await.unwrap());
    }
}
