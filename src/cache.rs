//! Redis-backed cache.
//!
//! Services only see the [`Cache`] trait. Values are stored as JSON strings
//! through [`get_json`] / [`set_json`]; every key is built by one of the
//! helpers in [`keys`] so the prefixes stay in one place.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde::{Serialize, de::DeserializeOwned};

/// Cache failures.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("cached value is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Key/value cache with per-entry TTL.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Read and remove `key` in one step. Of several concurrent callers at
    /// most one sees the value.
    async fn take(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Increment the counter at `key`, creating it with `ttl` if absent.
    /// Later increments keep the original expiry.
    async fn incr(&self, key: &str, ttl: Duration) -> Result<i64, CacheError>;

    async fn ping(&self) -> Result<(), CacheError>;
}

/// Cache key builders.
pub mod keys {
    pub const IPO_LIST: &str = "ipo:list";

    pub fn funds(client_id: &str) -> String {
        format!("funds:{client_id}")
    }

    pub fn ipo_orders(client_id: &str) -> String {
        format!("ipo:orders:{client_id}")
    }

    pub fn profile(client_id: &str) -> String {
        format!("profile:{client_id}")
    }

    pub fn freeze_otp(client_id: &str) -> String {
        format!("freeze_otp:{client_id}")
    }

    pub fn freeze_otp_attempts(client_id: &str) -> String {
        format!("freeze_otp_attempts:{client_id}")
    }
}

/// Read and decode a JSON value.
pub async fn get_json<T: DeserializeOwned>(
    cache: &dyn Cache,
    key: &str,
) -> Result<Option<T>, CacheError> {
    match cache.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode and store a JSON value.
pub async fn set_json<T: Serialize + Sync>(
    cache: &dyn Cache,
    key: &str,
    value: &T,
    ttl: Duration,
) -> Result<(), CacheError> {
    let raw = serde_json::to_string(value)?;
    cache.set(key, &raw, ttl).await
}

/// [`Cache`] over a multiplexed, auto-reconnecting Redis connection.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connect to `redis_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the first connection fails.
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        // SET with EX of zero is rejected by redis
        let secs = ttl.as_secs().max(1);
        let _: () = conn.set_ex(key, value, secs).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GETDEL").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn incr(&self, key: &str, ttl: Duration) -> Result<i64, CacheError> {
        let mut conn = self.conn.clone();
        // SET NX only succeeds for a fresh counter, so the expiry is never extended
        let (count,): (i64,) = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(key)
            .arg(0)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .arg("NX")
            .ignore()
            .incr(key, 1)
            .query_async(&mut conn)
            .await?;
        Ok(count)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryCache;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        qty: u32,
    }

    #[test]
    fn keys_carry_domain_prefixes() {
        assert_eq!(keys::funds("AB123"), "funds:AB123");
        assert_eq!(keys::ipo_orders("AB123"), "ipo:orders:AB123");
        assert_eq!(keys::profile("AB123"), "profile:AB123");
        assert_eq!(keys::freeze_otp("AB123"), "freeze_otp:AB123");
        assert_eq!(
            keys::freeze_otp_attempts("AB123"),
            "freeze_otp_attempts:AB123"
        );
    }

    #[tokio::test]
    async fn json_helpers_store_and_load() {
        let cache = MemoryCache::default();
        let value = Sample {
            name: "lot".into(),
            qty: 14,
        };

        set_json(&cache, "k", &value, Duration::from_secs(60))
            .await
            .unwrap();
        let loaded: Option<Sample> = get_json(&cache, "k").await.unwrap();

        assert_eq!(loaded, Some(value));
        assert_eq!(cache.ttl_of("k"), Some(Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn take_hands_the_value_out_once() {
        let cache = MemoryCache::default();
        cache.set("k", "v", Duration::from_secs(5)).await.unwrap();

        assert_eq!(cache.take("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(cache.take("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn incr_keeps_the_first_ttl() {
        let cache = MemoryCache::default();

        assert_eq!(cache.incr("n", Duration::from_secs(30)).await.unwrap(), 1);
        assert_eq!(cache.incr("n", Duration::from_secs(90)).await.unwrap(), 2);
        assert_eq!(cache.ttl_of("n"), Some(Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn corrupt_entry_is_a_serde_error() {
        let cache = MemoryCache::default();
        cache.set("k", "{not json", Duration::from_secs(1)).await.unwrap();

        let err = get_json::<Sample>(&cache, "k").await.unwrap_err();
        assert!(matches!(err, CacheError::Serde(_)));
    }
}
