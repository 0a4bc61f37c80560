use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Lifetime of a link and of its hit counter, counted from the last write.
pub const LINK_TTL: Duration = Duration::from_secs(3 * 24 * 60 * 60);
pub const URL_KEY_PREFIX: &str = "url:";
pub const HITS_KEY_PREFIX: &str = "hits:";

const SCAN_BATCH: usize = 100;

pub fn url_key(short_id: &str) -> String {
    format!("{URL_KEY_PREFIX}{short_id}")
}

pub fn hits_key(short_id: &str) -> String {
    format!("{HITS_KEY_PREFIX}{short_id}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Backend(String),
    Timeout,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Backend(msg) => write!(f, "Store operation failed: {msg}"),
            StoreError::Timeout => write!(f, "Store operation timed out"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_timeout() {
            StoreError::Timeout
        } else {
            StoreError::Backend(err.to_string())
        }
    }
}

/// Key-value store with per-key expiry.
///
/// Every operation is a remote call. `set_if_absent` and `increment` must be
/// atomic on the backend; nothing above this trait adds locking.
#[async_trait]
pub trait LinkStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Creates `key` only if it does not exist yet. Returns whether it was created.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration)
        -> Result<bool, StoreError>;

    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Atomically increments the counter at `key`, starting from 0 when absent.
    async fn increment(&self, key: &str) -> Result<i64, StoreError>;

    async fn set_expiry(&self, key: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Remaining lifetime of `key`; `None` when the key has no expiry or is gone.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError>;

    /// Lists every key starting with `prefix`.
    ///
    /// This walks the whole keyspace and is only meant for administrative use.
    async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(address: &str) -> Result<Self, StoreError> {
        let url = if address.contains("://") {
            address.to_string()
        } else {
            format!("redis://{address}/")
        };
        let client = redis::Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;
        debug!("Redis connection manager created for {}", address);
        Ok(Self { connection })
    }
}

#[async_trait]
impl LinkStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut connection = self.connection.clone();
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut connection)
            .await?;
        Ok(value)
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let mut connection = self.connection.clone();
        // SET .. NX replies OK when written and nil when the key already exists
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs())
            .query_async(&mut connection)
            .await?;
        Ok(reply.is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let mut connection = self.connection.clone();
        let count: i64 = redis::cmd("EXISTS")
            .arg(key)
            .query_async(&mut connection)
            .await?;
        Ok(count > 0)
    }

    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        let mut connection = self.connection.clone();
        let value: i64 = redis::cmd("INCR")
            .arg(key)
            .query_async(&mut connection)
            .await?;
        Ok(value)
    }

    async fn set_expiry(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        let _: i64 = redis::cmd("EXPIRE")
            .arg(key)
            .arg(ttl.as_secs())
            .query_async(&mut connection)
            .await?;
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let mut connection = self.connection.clone();
        // -1 means no expiry, -2 means the key is gone
        let seconds: i64 = redis::cmd("TTL")
            .arg(key)
            .query_async(&mut connection)
            .await?;
        Ok(u64::try_from(seconds).ok().map(Duration::from_secs))
    }

    async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut connection = self.connection.clone();
        let pattern = format!("{prefix}*");
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut connection)
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        // SCAN may return a key more than once while the keyspace is rehashed
        keys.sort_unstable();
        keys.dedup();
        Ok(keys)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        let _: String = redis::cmd("PING").query_async(&mut connection).await?;
        Ok(())
    }
}
