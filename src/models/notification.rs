use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::status::ReleaseId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Like,
    Comment,
    Reply,
}

/// The user whose action produced a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorySummary {
    pub id: i64,
    pub title: String,
}

/// Per-user activity notification, as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationItem {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub triggered_by: UserSummary,
    #[serde(default)]
    pub story: Option<StorySummary>,
    #[serde(default)]
    pub story_id: Option<i64>,
}

impl NotificationItem {
    /// Story this notification points at, preferring the explicit `story_id`.
    pub fn target_story(&self) -> Option<i64> {
        self.story_id.or_else(|| self.story.as_ref().map(|s| s.id))
    }

    /// Route the client navigates to when the item is clicked.
    pub fn target_path(&self) -> Option<String> {
        self.target_story().map(|id| format!("/stories/{}", id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseType {
    Major,
    Minor,
    Patch,
    Security,
}

/// Release announcement shown in the notification dropdown. Read state is not
/// tracked client-side; `is_new` comes from the server. The id is the same
/// opaque string-or-number release id the status endpoint sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseNoteNotification {
    pub id: ReleaseId,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    pub version: String,
    pub release_type: ReleaseType,
    pub release_date: String,
    #[serde(default)]
    pub is_new: bool,
}

/// List endpoints answer either with a bare array or a paginated envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListBody<T> {
    Plain(Vec<T>),
    Paginated { results: Vec<T> },
}

impl<T> ListBody<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            ListBody::Plain(items) => items,
            ListBody::Paginated { results } => results,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UnreadCount {
    #[serde(alias = "unread_count")]
    pub count: u64,
}
