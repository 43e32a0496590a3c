//! Persisted per-browser key/value state.
//!
//! Every browser session owns a small namespace of string entries
//! (`booking_selection`, `currency_code`, `exchange_rate`). Storage is
//! best-effort: callers log failures and carry on with in-memory state.
//!
//! # Backends
//!
//! - [`MemoryStorage`]: process-local map, lost on restart
//! - [`RedisStorage`]: Redis keys `coral:session:{session_id}:{key}` with a
//!   TTL refreshed on every write

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Key of the in-progress booking selection.
pub const KEY_BOOKING_SELECTION: &str = "booking_selection";
/// Key of the preferred display currency code.
pub const KEY_CURRENCY_CODE: &str = "currency_code";
/// Key of the cached exchange rate for the preferred currency.
pub const KEY_EXCHANGE_RATE: &str = "exchange_rate";

/// Storage backend failure.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Could not connect to the backend
    #[error("storage connection failed: {0}")]
    Connection(String),

    /// A command was sent but failed
    #[error("storage command failed: {0}")]
    Command(String),
}

impl From<redis::RedisError> for StorageError {
    fn from(e: redis::RedisError) -> Self {
        if e.is_connection_dropped() || e.is_connection_refusal() || e.is_io_error() {
            Self::Connection(e.to_string())
        } else {
            Self::Command(e.to_string())
        }
    }
}

/// String key/value storage partitioned by namespace (one per browser session).
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Read an entry.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend fails.
    async fn get_item(&self, namespace: &str, key: &str) -> Result<Option<String>, StorageError>;

    /// Write an entry, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend fails.
    async fn set_item(&self, namespace: &str, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete an entry; deleting a missing entry is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend fails.
    async fn remove_item(&self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend fails.
    async fn ping(&self) -> Result<(), StorageError>;

    /// Backend name for logs and readiness reports.
    fn backend(&self) -> &'static str;
}

/// In-process storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<RwLock<HashMap<(String, String), String>>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries across all namespaces.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns `true` if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get_item(&self, namespace: &str, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    async fn set_item(&self, namespace: &str, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .await
            .insert((namespace.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .await
            .remove(&(namespace.to_string(), key.to_string()));
        Ok(())
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Redis-backed storage with sliding expiry.
#[derive(Clone)]
pub struct RedisStorage {
    conn_manager: ConnectionManager,
    ttl: Duration,
}

impl std::fmt::Debug for RedisStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStorage")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl RedisStorage {
    /// Connect to Redis.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://127.0.0.1:6379")
    /// * `ttl` - Lifetime of an entry after its last write
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Connection`] if the client cannot be created
    /// or the first connection fails.
    pub async fn connect(redis_url: &str, ttl: Duration) -> Result<Self, StorageError> {
        let client = Client::open(redis_url)
            .map_err(|e| StorageError::Connection(format!("invalid Redis URL: {e}")))?;

        let conn_manager = ConnectionManager::new(client)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(Self { conn_manager, ttl })
    }

    fn entry_key(namespace: &str, key: &str) -> String {
        format!("coral:session:{namespace}:{key}")
    }
}

#[async_trait]
impl KeyValueStorage for RedisStorage {
    async fn get_item(&self, namespace: &str, key: &str) -> Result<Option<String>, StorageError> {
        let mut conn = self.conn_manager.clone();
        let value: Option<String> = conn.get(Self::entry_key(namespace, key)).await?;
        Ok(value)
    }

    async fn set_item(&self, namespace: &str, key: &str, value: &str) -> Result<(), StorageError> {
        let mut conn = self.conn_manager.clone();
        let _: () = conn
            .set_ex(Self::entry_key(namespace, key), value, self.ttl.as_secs().max(1))
            .await?;
        Ok(())
    }

    async fn remove_item(&self, namespace: &str, key: &str) -> Result<(), StorageError> {
        let mut conn = self.conn_manager.clone();
        let _: () = conn.del(Self::entry_key(namespace, key)).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StorageError> {
        let mut conn = self.conn_manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

/// A storage backend scoped to one browser session.
#[derive(Clone)]
pub struct SessionStorage {
    backend: Arc<dyn KeyValueStorage>,
    namespace: String,
}

impl std::fmt::Debug for SessionStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStorage")
            .field("backend", &self.backend.backend())
            .field("namespace", &self.namespace)
            .finish()
    }
}

impl SessionStorage {
    /// Scope `backend` to the browser session `session_id`.
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueStorage>, session_id: Uuid) -> Self {
        Self {
            backend,
            namespace: session_id.to_string(),
        }
    }

    /// Read an entry of this session.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend fails.
    pub async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.backend.get_item(&self.namespace, key).await
    }

    /// Write an entry of this session.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend fails.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.backend.set_item(&self.namespace, key, value).await
    }

    /// Delete an entry of this session.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend fails.
    pub async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.backend.remove_item(&self.namespace, key).await
    }
}
