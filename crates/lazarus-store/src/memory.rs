use std::{
    collections::{BTreeSet, HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use tokio::time::Instant;

use crate::{
    error::{StoreError, StoreResult},
    store::Store,
};

/// In-process [`Store`] with the same semantics as the Redis backend.
///
/// Every operation runs under one lock, which makes each call atomic with
/// respect to all others. Expiry is evaluated lazily against the tokio clock,
/// so paused-time tests can advance past a TTL.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    entries: HashMap<String, Entry>,
}

struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

enum Value {
    Bytes(Vec<u8>),
    List(VecDeque<String>),
    Set(BTreeSet<String>),
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryStoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MemoryStoreInner {
    /// Live entry for `key`, dropping it first if it has expired.
    fn live(&mut self, key: &str) -> Option<&mut Entry> {
        let expired = self
            .entries
            .get(key)
            .and_then(|e| e.expires_at)
            .is_some_and(|at| at <= Instant::now());
        if expired {
            self.entries.remove(key);
        }
        self.entries.get_mut(key)
    }

    fn list(&mut self, key: &str) -> StoreResult<Option<&mut VecDeque<String>>> {
        match self.live(key) {
            None => Ok(None),
            Some(Entry {
                value: Value::List(list),
                ..
            }) => Ok(Some(list)),
            Some(_) => Err(wrong_type(key, "list")),
        }
    }

    fn list_or_create(&mut self, key: &str) -> StoreResult<&mut VecDeque<String>> {
        if self.live(key).is_none() {
            self.entries.insert(
                key.to_string(),
                Entry {
                    value: Value::List(VecDeque::new()),
                    expires_at: None,
                },
            );
        }
        self.list(key)?.ok_or_else(|| wrong_type(key, "list"))
    }

    fn set(&mut self, key: &str) -> StoreResult<Option<&mut BTreeSet<String>>> {
        match self.live(key) {
            None => Ok(None),
            Some(Entry {
                value: Value::Set(set),
                ..
            }) => Ok(Some(set)),
            Some(_) => Err(wrong_type(key, "set")),
        }
    }

    /// Empty lists and sets cease to exist, as they do in Redis.
    fn prune(&mut self, key: &str) {
        let empty = match self.entries.get(key).map(|e| &e.value) {
            Some(Value::List(list)) => list.is_empty(),
            Some(Value::Set(set)) => set.is_empty(),
            _ => false,
        };
        if empty {
            self.entries.remove(key);
        }
    }
}

fn wrong_type(key: &str, expected: &'static str) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
        expected,
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn set_members(&self, set: &str) -> StoreResult<Vec<String>> {
        let mut state = self.state();
        Ok(state
            .set(set)?
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn set_add(&self, set: &str, member: &str) -> StoreResult<()> {
        let mut state = self.state();
        match state.set(set)? {
            Some(members) => {
                members.insert(member.to_string());
            }
            None => {
                let members = BTreeSet::from([member.to_string()]);
                state.entries.insert(
                    set.to_string(),
                    Entry {
                        value: Value::Set(members),
                        expires_at: None,
                    },
                );
            }
        }
        Ok(())
    }

    async fn set_remove(&self, set: &str, member: &str) -> StoreResult<()> {
        let mut state = self.state();
        if let Some(members) = state.set(set)? {
            members.remove(member);
        }
        state.prune(set);
        Ok(())
    }

    async fn key_exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.state().live(key).is_some())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let mut state = self.state();
        match state.live(key) {
            None => Ok(None),
            Some(Entry {
                value: Value::Bytes(bytes),
                ..
            }) => Ok(Some(bytes.clone())),
            Some(_) => Err(wrong_type(key, "string")),
        }
    }

    async fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        self.state().entries.insert(
            key.to_string(),
            Entry {
                value: Value::Bytes(value.to_vec()),
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> StoreResult<()> {
        self.state().entries.insert(
            key.to_string(),
            Entry {
                value: Value::Bytes(value.to_vec()),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut state = self.state();
        let existed = state.live(key).is_some();
        state.entries.remove(key);
        Ok(existed)
    }

    async fn list_push(&self, list: &str, value: &str) -> StoreResult<()> {
        self.state()
            .list_or_create(list)?
            .push_front(value.to_string());
        Ok(())
    }

    async fn pop_push(&self, source: &str, destination: &str) -> StoreResult<Option<String>> {
        let mut state = self.state();
        // Type-check the destination before mutating the source.
        state.list(destination)?;
        let Some(value) = state.list(source)?.and_then(|l| l.pop_back()) else {
            return Ok(None);
        };
        state.prune(source);
        state
            .list_or_create(destination)?
            .push_front(value.clone());
        Ok(Some(value))
    }

    async fn list_transfer(
        &self,
        source: &str,
        value: &str,
        destination: &str,
        replacement: &str,
    ) -> StoreResult<bool> {
        let mut state = self.state();
        state.list(destination)?;
        let removed = match state.list(source)? {
            Some(list) => match list.iter().position(|v| v == value) {
                Some(idx) => list.remove(idx).is_some(),
                None => false,
            },
            None => false,
        };
        if !removed {
            return Ok(false);
        }
        state.prune(source);
        state
            .list_or_create(destination)?
            .push_front(replacement.to_string());
        Ok(true)
    }

    async fn list_remove(&self, list: &str, value: &str) -> StoreResult<usize> {
        let mut state = self.state();
        let removed = match state.list(list)? {
            Some(items) => match items.iter().position(|v| v == value) {
                Some(idx) => usize::from(items.remove(idx).is_some()),
                None => 0,
            },
            None => 0,
        };
        state.prune(list);
        Ok(removed)
    }

    async fn list_range(&self, list: &str) -> StoreResult<Vec<String>> {
        let mut state = self.state();
        Ok(state
            .list(list)?
            .map(|items| items.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
