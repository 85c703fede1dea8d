//! Durable backends for the seen-registry.
//!
//! The registry is a single list of release ids, read in full and rewritten in
//! full on every append. The backend is picked from `TIDINGS_SEEN_STORE`:
//!
//! ```text
//! # JSON file on this device (default)
//! TIDINGS_SEEN_STORE=file://.tidings/seen_releases.json
//!
//! # Redis key holding the same JSON array
//! TIDINGS_SEEN_STORE=redis://127.0.0.1:6379
//!
//! # Process-local, lost on exit
//! TIDINGS_SEEN_STORE=memory://
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::RwLock;

use crate::errors::StorageError;

/// Redis key (and logical storage key) for the seen list.
pub const SEEN_KEY: &str = "tidings:seen_release_ids";

#[async_trait]
pub trait SeenStorage: Send + Sync {
    /// Read the whole list. A missing list is empty, not an error.
    async fn load(&self) -> Result<Vec<String>, StorageError>;

    /// Replace the whole list.
    async fn save(&self, ids: &[String]) -> Result<(), StorageError>;

    fn describe(&self) -> String;
}

// ── File ──────────────────────────────────────────────────────

pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SeenStorage for FileStorage {
    async fn load(&self) -> Result<Vec<String>, StorageError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, ids: &[String]) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        // Write-then-rename so a crash never leaves a half-written list.
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, serde_json::to_vec(ids)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file://{}", self.path.display())
    }
}

// ── Redis ─────────────────────────────────────────────────────

pub struct RedisStorage {
    conn: ConnectionManager,
    key: String,
}

impl RedisStorage {
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self {
            conn,
            key: SEEN_KEY.to_string(),
        })
    }
}

#[async_trait]
impl SeenStorage for RedisStorage {
    async fn load(&self) -> Result<Vec<String>, StorageError> {
        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(&self.key).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, ids: &[String]) -> Result<(), StorageError> {
        let json = serde_json::to_string(ids)?;
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(&self.key, json).await?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("redis key {}", self.key)
    }
}

// ── Memory ────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStorage(RwLock<Vec<String>>);

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SeenStorage for MemoryStorage {
    async fn load(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.0.read().await.clone())
    }

    async fn save(&self, ids: &[String]) -> Result<(), StorageError> {
        *self.0.write().await = ids.to_vec();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Open the backend named by `url`. A bare path is treated as a file.
pub async fn open(url: &str) -> Result<Arc<dyn SeenStorage>, StorageError> {
    let url = url.trim();
    let storage: Arc<dyn SeenStorage> = if url.starts_with("redis://") || url.starts_with("rediss://") {
        Arc::new(RedisStorage::connect(url).await?)
    } else if url == "memory://" {
        Arc::new(MemoryStorage::new())
    } else if let Some(path) = url.strip_prefix("file://") {
        Arc::new(FileStorage::new(path))
    } else if url.contains("://") || url.is_empty() {
        return Err(StorageError::Unsupported(url.to_string()));
    } else {
        Arc::new(FileStorage::new(url))
    };

    tracing::info!(backend = %storage.describe(), "seen registry: storage opened");
    Ok(storage)
}
