use std::{sync::LazyLock, time::Duration};

use async_trait::async_trait;
use redis::{AsyncCommands, Client, Script, aio::ConnectionManager};
use tracing::{debug, instrument};

use crate::{error::StoreResult, store::Store};

/// Remove one occurrence of ARGV[1] from KEYS[1] and, if found, push ARGV[2]
/// onto KEYS[2], both in one server-side step.
static TRANSFER_ELEMENT: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r"
if redis.call('LREM', KEYS[1], 1, ARGV[1]) > 0 then
  redis.call('LPUSH', KEYS[2], ARGV[2])
  return 1
end
return 0
",
    )
});

/// [`Store`] backed by a Redis server.
///
/// Cloning is cheap; all clones share one multiplexed connection that
/// reconnects on its own after transport failures.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Open a managed connection to `url` (e.g. `redis://127.0.0.1:6379/0`).
    #[instrument(level = "debug", skip(url))]
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let client = Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        debug!("redis connection established");
        Ok(Self { conn })
    }

    #[inline]
    fn conn(&self) -> ConnectionManager {
        self.conn.clone()
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn set_members(&self, set: &str) -> StoreResult<Vec<String>> {
        let members: Vec<String> = self.conn().smembers(set).await?;
        Ok(members)
    }

    async fn set_add(&self, set: &str, member: &str) -> StoreResult<()> {
        let _: () = self.conn().sadd(set, member).await?;
        Ok(())
    }

    async fn set_remove(&self, set: &str, member: &str) -> StoreResult<()> {
        let _: () = self.conn().srem(set, member).await?;
        Ok(())
    }

    async fn key_exists(&self, key: &str) -> StoreResult<bool> {
        let exists: bool = self.conn().exists(key).await?;
        Ok(exists)
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let value: Option<Vec<u8>> = self.conn().get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let _: () = self.conn().set(key, value).await?;
        Ok(())
    }

    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> StoreResult<()> {
        let millis = ttl.as_millis().max(1) as u64;
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(millis)
            .query_async(&mut self.conn())
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let removed: usize = self.conn().del(key).await?;
        Ok(removed > 0)
    }

    async fn list_push(&self, list: &str, value: &str) -> StoreResult<()> {
        let _: () = self.conn().lpush(list, value).await?;
        Ok(())
    }

    async fn pop_push(&self, source: &str, destination: &str) -> StoreResult<Option<String>> {
        let moved: Option<String> = self.conn().rpoplpush(source, destination).await?;
        Ok(moved)
    }

    async fn list_transfer(
        &self,
        source: &str,
        value: &str,
        destination: &str,
        replacement: &str,
    ) -> StoreResult<bool> {
        let mut invocation = TRANSFER_ELEMENT.prepare_invoke();
        invocation
            .key(source)
            .key(destination)
            .arg(value)
            .arg(replacement);
        let moved: i64 = invocation.invoke_async(&mut self.conn()).await?;
        Ok(moved == 1)
    }

    async fn list_remove(&self, list: &str, value: &str) -> StoreResult<usize> {
        let removed: usize = self.conn().lrem(list, 1, value).await?;
        Ok(removed)
    }

    async fn list_range(&self, list: &str) -> StoreResult<Vec<String>> {
        let items: Vec<String> = self.conn().lrange(list, 0, -1).await?;
        Ok(items)
    }

    async fn ping(&self) -> StoreResult<()> {
        let _: String = redis::cmd("PING").query_async(&mut self.conn()).await?;
        Ok(())
    }
}
