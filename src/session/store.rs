//! Token store client for serialized session blobs.
//!
//! The store is an external key-value service (Redis in production) holding
//! `prefix + session id -> bytes` with TTL-based expiry. Every call is bounded
//! by a timeout; a timeout is reported as the store being unavailable so the
//! session interface can degrade instead of hanging a request.

use async_trait::async_trait;
use redis::AsyncCommands;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum StoreError {
    /// Network failure, timeout, or the service not accepting connections.
    #[error("token store unavailable: {0}")]
    Unavailable(String),
    /// The service answered with an error.
    #[error("token store backend error: {0}")]
    Backend(String),
    /// Connection options that can never reach a store.
    #[error("invalid token store configuration: {0}")]
    Configuration(String),
}

/// Narrow client contract the session interface depends on.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    async fn set(&self, key: &str, value: &[u8], ttl_seconds: u64) -> Result<(), StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Connection options for the production store, see `SESSION_STORE_*`.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub db: i64,
    pub password: Option<SecretString>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            db: 0,
            password: None,
        }
    }
}

/// Redis-backed token store.
pub struct RedisStore {
    client: redis::Client,
    timeout: Duration,
}

impl RedisStore {
    /// Build a client from connection options.
    ///
    /// # Errors
    /// Returns `StoreError::Configuration` when the options do not form a
    /// valid connection URL.
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let mut url = Url::parse(&format!(
            "redis://{}:{}/{}",
            config.host, config.port, config.db
        ))
        .map_err(|err| StoreError::Configuration(err.to_string()))?;

        if let Some(password) = &config.password {
            url.set_password(Some(password.expose_secret()))
                .map_err(|()| StoreError::Configuration("cannot set password".to_string()))?;
        }

        let client = redis::Client::open(url.as_str())
            .map_err(|err| StoreError::Configuration(err.to_string()))?;

        Ok(Self {
            client,
            timeout: DEFAULT_CALL_TIMEOUT,
        })
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, StoreError> {
        let connect = self.client.get_multiplexed_async_connection();
        match tokio::time::timeout(self.timeout, connect).await {
            Ok(Ok(connection)) => Ok(connection),
            Ok(Err(err)) => Err(StoreError::Unavailable(err.to_string())),
            Err(_) => Err(StoreError::Unavailable("connect timed out".to_string())),
        }
    }

    async fn bounded<T>(
        &self,
        call: impl std::future::Future<Output = redis::RedisResult<T>> + Send,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) if err.is_io_error() || err.is_connection_refusal() => {
                Err(StoreError::Unavailable(err.to_string()))
            }
            Ok(Err(err)) => Err(StoreError::Backend(err.to_string())),
            Err(_) => Err(StoreError::Unavailable("call timed out".to_string())),
        }
    }
}

#[async_trait]
impl TokenStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut connection = self.connection().await?;
        self.bounded(async move { connection.get(key).await }).await
    }

    async fn set(&self, key: &str, value: &[u8], ttl_seconds: u64) -> Result<(), StoreError> {
        let mut connection = self.connection().await?;
        self.bounded(async move { connection.set_ex(key, value, ttl_seconds).await })
            .await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut connection = self.connection().await?;
        self.bounded(async move { connection.del(key).await }).await
    }
}

/// In-process store for tests and single-node hosts. Records the TTL handed
/// to `set` so expiry policy can be asserted without a clock.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, (Vec<u8>, u64)>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// TTL recorded by the last `set` for `key`, if the key is present.
    pub fn ttl_of(&self, key: &str) -> Option<u64> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).map(|(_, ttl)| *ttl))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .is_ok_and(|entries| entries.contains_key(key))
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store marked down".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.check_available()?;
        let entries = self
            .entries
            .lock()
            .map_err(|err| StoreError::Backend(err.to_string()))?;
        Ok(entries.get(key).map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: &[u8], ttl_seconds: u64) -> Result<(), StoreError> {
        self.check_available()?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|err| StoreError::Backend(err.to_string()))?;
        entries.insert(key.to_string(), (value.to_vec(), ttl_seconds));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.check_available()?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|err| StoreError::Backend(err.to_string()))?;
        entries.remove(key);
        Ok(())
    }
}
