//! REST boundary. The detector and the feed only see these traits; `HttpApi`
//! is the production implementation.

pub mod http;

use async_trait::async_trait;

use crate::errors::ClientError;
use crate::models::notification::{NotificationItem, ReleaseNoteNotification};
use crate::models::status::StatusPayload;

pub use http::HttpApi;

/// Public status endpoint (no authentication).
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self) -> Result<StatusPayload, ClientError>;
}

/// Authenticated notification endpoints.
#[async_trait]
pub trait NotificationApi: Send + Sync {
    async fn unread_count(&self) -> Result<u64, ClientError>;

    /// Activity notifications, most recent first.
    async fn list_notifications(&self, unread_only: bool) -> Result<Vec<NotificationItem>, ClientError>;

    async fn list_release_notes(&self) -> Result<Vec<ReleaseNoteNotification>, ClientError>;

    async fn mark_read(&self, notification_id: i64) -> Result<(), ClientError>;

    async fn mark_all_read(&self) -> Result<(), ClientError>;
}
