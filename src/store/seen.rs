//! Device-scoped record of release ids that already triggered a modal
//! announcement. Entries are append-only and never expire.
//!
//! Storage failures never propagate: an unreadable list counts as "not seen",
//! which risks a repeat announcement rather than never recording one. A list
//! that cannot be read is never overwritten; only corrupt contents are replaced.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::backend::SeenStorage;
use crate::errors::StorageError;
use crate::models::status::ReleaseId;

#[derive(Clone)]
pub struct SeenRegistry {
    storage: Arc<dyn SeenStorage>,
    /// Serialises read-modify-write cycles from this process.
    write_lock: Arc<Mutex<()>>,
}

impl SeenRegistry {
    pub fn new(storage: Arc<dyn SeenStorage>) -> Self {
        Self {
            storage,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn has_seen(&self, id: &ReleaseId) -> bool {
        match self.storage.load().await {
            Ok(ids) => ids.iter().any(|seen| seen == id.as_str()),
            Err(e) => {
                warn!(release_id = %id, error = %e, "seen registry: read failed, treating as unseen");
                false
            }
        }
    }

    /// Append `id` if absent. Returns `true` when the id was newly recorded.
    ///
    /// Corrupt contents are replaced by a fresh list. Any other read failure
    /// skips the write so existing entries are never lost.
    pub async fn mark_seen(&self, id: &ReleaseId) -> bool {
        let _guard = self.write_lock.lock().await;

        let mut ids = match self.storage.load().await {
            Ok(ids) => ids,
            Err(e @ StorageError::Corrupt(_)) => {
                warn!(release_id = %id, error = %e, "seen registry: corrupt contents, rewriting from empty");
                Vec::new()
            }
            Err(e) => {
                warn!(release_id = %id, error = %e, "seen registry: read failed, not recording");
                return false;
            }
        };
        if ids.iter().any(|seen| seen == id.as_str()) {
            return false;
        }
        ids.push(id.to_string());

        match self.storage.save(&ids).await {
            Ok(()) => {
                debug!(release_id = %id, total = ids.len(), "seen registry: recorded");
                true
            }
            Err(e) => {
                warn!(release_id = %id, error = %e, "seen registry: write failed");
                false
            }
        }
    }

    /// Every recorded id, oldest first. Empty when the store is unreadable.
    pub async fn seen_ids(&self) -> Vec<String> {
        self.storage.load().await.unwrap_or_else(|e| {
            warn!(error = %e, "seen registry: read failed");
            Vec::new()
        })
    }

    pub fn describe(&self) -> String {
        self.storage.describe()
    }
}
