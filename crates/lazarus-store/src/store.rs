use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::error::StoreResult;

/// Handle to the store shared by every component of a process.
pub type SharedStore = Arc<dyn Store>;

/// Primitives of the shared store.
///
/// Lists follow Redis conventions: the head is the left end, `list_push`
/// prepends, and `pop_push` takes from the tail. A list pushed with
/// `list_push` and consumed with `pop_push` is therefore FIFO.
///
/// Absent keys are never an error: an absent set has no members, an absent
/// list is empty, an absent key does not exist.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Members of a set, in store-defined order.
    async fn set_members(&self, set: &str) -> StoreResult<Vec<String>>;

    async fn set_add(&self, set: &str, member: &str) -> StoreResult<()>;

    /// Remove a member. Removing a missing member succeeds.
    async fn set_remove(&self, set: &str, member: &str) -> StoreResult<()>;

    async fn key_exists(&self, key: &str) -> StoreResult<bool>;

    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Write a value that expires after `ttl` unless written again.
    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> StoreResult<()>;

    /// Delete a key, returning whether it existed.
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Prepend a value to a list.
    async fn list_push(&self, list: &str, value: &str) -> StoreResult<()>;

    /// Atomically pop the tail of `source` and push it onto the head of
    /// `destination`. `None` means `source` was empty.
    async fn pop_push(&self, source: &str, destination: &str) -> StoreResult<Option<String>>;

    /// Atomically remove one occurrence of `value` from `source` and, only if
    /// it was found, push `replacement` onto the head of `destination`.
    async fn list_transfer(
        &self,
        source: &str,
        value: &str,
        destination: &str,
        replacement: &str,
    ) -> StoreResult<bool>;

    /// [`Store::list_transfer`] that pushes the element unchanged.
    async fn list_move(&self, source: &str, value: &str, destination: &str) -> StoreResult<bool> {
        self.list_transfer(source, value, destination, value).await
    }

    /// Remove one occurrence of `value`, returning the number removed.
    async fn list_remove(&self, list: &str, value: &str) -> StoreResult<usize>;

    /// Full list contents, head first.
    async fn list_range(&self, list: &str) -> StoreResult<Vec<String>>;

    /// Connectivity check.
    async fn ping(&self) -> StoreResult<()>;
}
