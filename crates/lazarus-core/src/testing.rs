//! Test doubles shared by the protocol tests.

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use lazarus_model::WorkerId;
use lazarus_store::{MemoryStore, Store, StoreError, StoreResult};
use tokio_util::sync::CancellationToken;

use crate::topology::Topology;

/// Populate the store with one registered worker.
///
/// `active` and `watched` are given head first, the order `list_range`
/// reports them in.
pub(crate) async fn seed_worker(
    store: &MemoryStore,
    topology: &Topology,
    worker: &WorkerId,
    alive: bool,
    active: &[&str],
    watched: &[&str],
) {
    store
        .set_add(topology.worker_set(), worker.as_str())
        .await
        .unwrap();
    if alive {
        store
            .set_with_ttl(&topology.heartbeat_key(worker), b"0", Duration::from_secs(60))
            .await
            .unwrap();
    }
    for task in active.iter().rev() {
        store
            .list_push(&topology.active_queue(worker), task)
            .await
            .unwrap();
    }
    for task in watched.iter().rev() {
        store
            .list_push(&topology.watched_queue(worker), task)
            .await
            .unwrap();
    }
}

/// [`MemoryStore`] with switchable faults.
pub(crate) struct FaultyStore {
    inner: MemoryStore,
    fail_set_members: bool,
    fail_key_exists: Option<String>,
    fail_pop_push: Option<(String, AtomicUsize)>,
    cancel_after_remove: Option<(String, CancellationToken)>,
}

impl FaultyStore {
    pub(crate) fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail_set_members: false,
            fail_key_exists: None,
            fail_pop_push: None,
            cancel_after_remove: None,
        }
    }

    pub(crate) fn fail_set_members(mut self) -> Self {
        self.fail_set_members = true;
        self
    }

    pub(crate) fn fail_key_exists(mut self, key: impl Into<String>) -> Self {
        self.fail_key_exists = Some(key.into());
        self
    }

    /// Let `allowed` moves out of `source` succeed, then fail every one after.
    pub(crate) fn fail_pop_push_after(mut self, source: impl Into<String>, allowed: usize) -> Self {
        self.fail_pop_push = Some((source.into(), AtomicUsize::new(allowed)));
        self
    }

    pub(crate) fn cancel_after_remove(mut self, member: &str, ctx: CancellationToken) -> Self {
        self.cancel_after_remove = Some((member.to_string(), ctx));
        self
    }
}

fn injected() -> StoreError {
    StoreError::Unavailable("injected fault".to_string())
}

#[async_trait]
impl Store for FaultyStore {
    async fn set_members(&self, set: &str) -> StoreResult<Vec<String>> {
        if self.fail_set_members {
            return Err(injected());
        }
        self.inner.set_members(set).await
    }

    async fn set_add(&self, set: &str, member: &str) -> StoreResult<()> {
        self.inner.set_add(set, member).await
    }

    async fn set_remove(&self, set: &str, member: &str) -> StoreResult<()> {
        self.inner.set_remove(set, member).await?;
        if let Some((target, ctx)) = &self.cancel_after_remove
            && target == member
        {
            ctx.cancel();
        }
        Ok(())
    }

    async fn key_exists(&self, key: &str) -> StoreResult<bool> {
        if self.fail_key_exists.as_deref() == Some(key) {
            return Err(injected());
        }
        self.inner.key_exists(key).await
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        self.inner.set(key, value).await
    }

    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> StoreResult<()> {
        self.inner.set_with_ttl(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        self.inner.delete(key).await
    }

    async fn list_push(&self, list: &str, value: &str) -> StoreResult<()> {
        self.inner.list_push(list, value).await
    }

    async fn pop_push(&self, source: &str, destination: &str) -> StoreResult<Option<String>> {
        if let Some((target, budget)) = &self.fail_pop_push
            && target == source
        {
            let left = budget.load(Ordering::SeqCst);
            if left == 0 {
                return Err(injected());
            }
            budget.store(left - 1, Ordering::SeqCst);
        }
        self.inner.pop_push(source, destination).await
    }

    async fn list_transfer(
        &self,
        source: &str,
        value: &str,
        destination: &str,
        replacement: &str,
    ) -> StoreResult<bool> {
        self.inner
            .list_transfer(source, value, destination, replacement)
            .await
    }

    async fn list_remove(&self, list: &str, value: &str) -> StoreResult<usize> {
        self.inner.list_remove(list, value).await
    }

    async fn list_range(&self, list: &str) -> StoreResult<Vec<String>> {
        self.inner.list_range(list).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }
}
