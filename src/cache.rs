use async_trait::async_trait;
use dashmap::DashMap;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised by a [`KeyValueStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("cached value is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Minimal key/value contract the cache needs.
///
/// Implementations must be safe for concurrent use at the level of single key
/// operations. No cross-key atomicity is expected.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Store a value without expiration, replacing any previous value.
    async fn set(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    async fn exists(&self, key: &[u8]) -> Result<bool, StoreError>;
}

/// Hex-encoded 128-bit digest addressing one cached translation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for an (input, target code) pair.
    pub fn derive(input: &str, target_code: &str) -> Self {
        let mut material = Vec::with_capacity(input.len() + target_code.len());
        material.extend_from_slice(input.as_bytes());
        material.extend_from_slice(target_code.as_bytes());
        Self(format!("{:x}", md5::compute(&material)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Best-effort cache of translated text.
#[derive(Clone)]
pub struct ResultCache {
    store: Arc<dyn KeyValueStore>,
}

impl ResultCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Whether an entry exists for `key`.
    ///
    /// A store failure is logged and reported as a miss.
    pub async fn has(&self, key: &CacheKey) -> bool {
        match self.store.exists(key.as_str().as_bytes()).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Cache existence check failed for {}: {}", key, e);
                false
            }
        }
    }

    pub async fn get(&self, key: &CacheKey) -> Result<Option<String>, StoreError> {
        match self.store.get(key.as_str().as_bytes()).await? {
            Some(bytes) => Ok(Some(String::from_utf8(bytes)?)),
            None => Ok(None),
        }
    }

    /// Store a translation under `key`. Writing the same pair twice is harmless.
    pub async fn add(&self, key: &CacheKey, translation: &str) -> Result<(), StoreError> {
        self.store
            .set(key.as_str().as_bytes(), translation.as_bytes())
            .await
    }
}

/// Redis-backed store.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to `redis://{host}:{port}/`, database 0, no password.
    pub async fn connect(host: &str, port: u16) -> Result<Self, StoreError> {
        let url = format!("redis://{}:{}/", host, port);
        info!("Connecting to Redis at {}:{}", host, port);

        let client = redis::Client::open(url.as_str())?;
        let conn = ConnectionManager::new(client).await?;

        info!("Connected to Redis");
        Ok(Self { conn })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn exists(&self, key: &[u8]) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let found: bool = conn.exists(key).await?;
        Ok(found)
    }
}

/// In-process store backed by a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        debug!("Storing {} bytes in memory cache", value.len());
        self.entries.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    async fn exists(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.entries.contains_key(key))
    }
}
