//! Access layer for the shared key/list/set store.
//!
//! Everything the reclaim protocol needs from the store is expressed by the
//! [`Store`] trait. Each method maps onto a single atomic server-side command,
//! so callers can build lock-free protocols on top of it.

mod error;
pub use error::{StoreError, StoreResult};

mod store;
pub use store::{SharedStore, Store};

mod memory;
pub use memory::MemoryStore;

#[cfg(feature = "redis")]
mod redis_store;
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;
