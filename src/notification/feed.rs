//! Notification feed: unread badge plus the dropdown that merges release
//! announcements with activity notifications.
//!
//! The unread count is polled in the background; both lists are fetched only
//! when the dropdown opens. Each source is cached separately so a failure in
//! one never disturbs the other. The feed only mirrors server state: it never
//! invents or deletes items.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::NotificationApi;
use crate::errors::ClientError;
use crate::jobs::schedule::{spawn_recurring, PollHandle};
use crate::models::notification::{NotificationItem, ReleaseNoteNotification};
use crate::models::status::ReleaseId;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// One row of the rendered dropdown.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEntry {
    Release(ReleaseNoteNotification),
    /// Divider between the release and activity sections.
    Separator,
    Activity(NotificationItem),
}

#[derive(Default)]
struct FeedCaches {
    unread_count: RwLock<u64>,
    activity: RwLock<Vec<NotificationItem>>,
    releases: RwLock<Vec<ReleaseNoteNotification>>,
    open: AtomicBool,
}

#[derive(Clone)]
pub struct NotificationFeed {
    api: Arc<dyn NotificationApi>,
    caches: Arc<FeedCaches>,
}

impl NotificationFeed {
    pub fn new(api: Arc<dyn NotificationApi>) -> Self {
        Self {
            api,
            caches: Arc::new(FeedCaches::default()),
        }
    }

    // ── Refresh ───────────────────────────────────────────────

    /// Returns whether the count was updated; on failure the previous value stays.
    pub async fn refresh_unread_count(&self) -> bool {
        match self.api.unread_count().await {
            Ok(count) => {
                *self.caches.unread_count.write().await = count;
                debug!(count, "feed: unread count refreshed");
                true
            }
            Err(e) => {
                warn!(error = %e, "feed: unread count refresh failed");
                false
            }
        }
    }

    /// On failure the previous list stays.
    pub async fn refresh_activity_notifications(&self) -> bool {
        match self.api.list_notifications(false).await {
            Ok(items) => {
                debug!(count = items.len(), "feed: activity notifications refreshed");
                *self.caches.activity.write().await = items;
                true
            }
            Err(e) => {
                warn!(error = %e, "feed: activity notification refresh failed");
                false
            }
        }
    }

    /// On failure the list is cleared rather than left stale.
    pub async fn refresh_release_announcements(&self) -> bool {
        let (notes, ok) = match self.api.list_release_notes().await {
            Ok(notes) => (notes, true),
            Err(e) => {
                warn!(error = %e, "feed: release note refresh failed, clearing");
                (Vec::new(), false)
            }
        };
        *self.caches.releases.write().await = notes;
        ok
    }

    async fn refresh_after_mutation(&self) {
        futures::join!(
            self.refresh_unread_count(),
            self.refresh_activity_notifications()
        );
    }

    // ── Dropdown ──────────────────────────────────────────────

    /// Open the dropdown and fetch both lists.
    pub async fn open_dropdown(&self) {
        self.caches.open.store(true, Ordering::Release);
        futures::join!(
            self.refresh_activity_notifications(),
            self.refresh_release_announcements()
        );
    }

    pub fn close_dropdown(&self) {
        self.caches.open.store(false, Ordering::Release);
    }

    pub fn is_open(&self) -> bool {
        self.caches.open.load(Ordering::Acquire)
    }

    pub async fn unread_count(&self) -> u64 {
        *self.caches.unread_count.read().await
    }

    pub async fn activity(&self) -> Vec<NotificationItem> {
        self.caches.activity.read().await.clone()
    }

    pub async fn releases(&self) -> Vec<ReleaseNoteNotification> {
        self.caches.releases.read().await.clone()
    }

    /// Release announcements first, then a separator when both sections are
    /// non-empty, then activity notifications in server order.
    pub async fn entries(&self) -> Vec<FeedEntry> {
        let releases = self.caches.releases.read().await;
        let activity = self.caches.activity.read().await;

        let mut entries = Vec::with_capacity(releases.len() + activity.len() + 1);
        entries.extend(releases.iter().cloned().map(FeedEntry::Release));
        if !releases.is_empty() && !activity.is_empty() {
            entries.push(FeedEntry::Separator);
        }
        entries.extend(activity.iter().cloned().map(FeedEntry::Activity));
        entries
    }

    // ── Mutations ─────────────────────────────────────────────

    /// Mark one activity notification read. Unknown or already-read items are
    /// left alone. Returns whether a mark-read call was issued.
    pub async fn mark_one_read(&self, notification_id: i64) -> Result<bool, ClientError> {
        let unread = self
            .caches
            .activity
            .read()
            .await
            .iter()
            .any(|n| n.id == notification_id && !n.is_read);
        if !unread {
            return Ok(false);
        }

        self.api.mark_read(notification_id).await?;
        info!(notification_id, "feed: marked read");
        self.refresh_after_mutation().await;
        Ok(true)
    }

    pub async fn mark_all_read(&self) -> Result<(), ClientError> {
        self.api.mark_all_read().await?;
        info!("feed: marked all read");
        self.refresh_after_mutation().await;
        Ok(())
    }

    /// Handle a click on an activity notification: close the dropdown, mark it
    /// read if needed, and return the route to navigate to.
    pub async fn click_activity(&self, notification_id: i64) -> Option<String> {
        self.close_dropdown();
        let target = self
            .caches
            .activity
            .read()
            .await
            .iter()
            .find(|n| n.id == notification_id)
            .and_then(NotificationItem::target_path);

        if let Err(e) = self.mark_one_read(notification_id).await {
            warn!(notification_id, error = %e, "feed: mark read failed");
        }
        target
    }

    /// Release announcements have no destination yet; clicking only closes
    /// the dropdown.
    pub fn click_release(&self, release_id: &ReleaseId) {
        debug!(release_id = %release_id, "feed: release note clicked");
        self.close_dropdown();
    }

    /// Drop cached state, e.g. on logout.
    pub async fn reset(&self) {
        self.close_dropdown();
        *self.caches.unread_count.write().await = 0;
        self.caches.activity.write().await.clear();
        self.caches.releases.write().await.clear();
    }

    /// Poll the unread count now and then every `interval`.
    pub fn spawn(&self, interval: Duration) -> PollHandle {
        let feed = self.clone();
        spawn_recurring("notification_feed", Duration::ZERO, interval, move || {
            let feed = feed.clone();
            async move {
                feed.refresh_unread_count().await;
            }
        })
    }
}
