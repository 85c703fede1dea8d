use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Auto-dismiss delay applied when the caller does not pick one.
pub const DEFAULT_DURATION: Duration = Duration::from_millis(5000);

static NEXT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Alert identifier: creation millisecond plus a process-wide sequence number,
/// so alerts created within the same millisecond never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AlertId {
    pub created_ms: i64,
    pub seq: u64,
}

impl AlertId {
    pub fn generate() -> Self {
        Self {
            created_ms: Utc::now().timestamp_millis(),
            seq: NEXT_SEQ.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "alert-{}-{}", self.created_ms, self.seq)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
    Update,
}

impl AlertKind {
    pub fn default_title(&self) -> &'static str {
        match self {
            AlertKind::Info => "Info",
            AlertKind::Success => "Success",
            AlertKind::Warning => "Warning",
            AlertKind::Error => "Error",
            AlertKind::Update => "Update Available",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlertKind::Info => "info",
            AlertKind::Success => "success",
            AlertKind::Warning => "warning",
            AlertKind::Error => "error",
            AlertKind::Update => "update",
        };
        f.write_str(s)
    }
}

/// Explicit discriminant for alerts that carry a dedup rule beyond their kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCategory {
    #[default]
    General,
    /// Scheduled maintenance banner; at most one active `Warning` of this category.
    Maintenance,
    /// Release announcement raised by the update detector.
    Release,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub kind: AlertKind,
    pub category: AlertCategory,
    pub title: String,
    /// May contain embedded newlines.
    pub message: String,
    /// `Duration::ZERO` means the alert never auto-dismisses.
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    pub dismissible: bool,
    pub is_modal: bool,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    pub fn is_maintenance(&self) -> bool {
        self.kind == AlertKind::Warning && self.category == AlertCategory::Maintenance
    }

    pub fn auto_dismisses(&self) -> bool {
        !self.duration.is_zero()
    }
}

/// Per-call overrides for the `show_*` helpers. Unset fields fall back to the
/// helper's own defaults.
#[derive(Debug, Clone, Default)]
pub struct AlertOptions {
    pub title: Option<String>,
    pub duration: Option<Duration>,
    pub dismissible: Option<bool>,
    pub is_modal: Option<bool>,
}

impl AlertOptions {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn dismissible(mut self, dismissible: bool) -> Self {
        self.dismissible = Some(dismissible);
        self
    }

    pub fn modal(mut self, is_modal: bool) -> Self {
        self.is_modal = Some(is_modal);
        self
    }
}

/// Request to create an alert. `AlertStore::add` fills in the id and defaults.
#[derive(Debug, Clone, Default)]
pub struct AlertInput {
    pub kind: AlertKind,
    pub category: AlertCategory,
    pub message: String,
    pub options: AlertOptions,
}

impl AlertInput {
    pub fn new(kind: AlertKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            category: AlertCategory::General,
            message: message.into(),
            options: AlertOptions::default(),
        }
    }

    pub fn category(mut self, category: AlertCategory) -> Self {
        self.category = category;
        self
    }

    pub fn options(mut self, options: AlertOptions) -> Self {
        self.options = options;
        self
    }

    pub(crate) fn into_alert(self) -> Alert {
        let AlertOptions {
            title,
            duration,
            dismissible,
            is_modal,
        } = self.options;
        Alert {
            id: AlertId::generate(),
            kind: self.kind,
            category: self.category,
            title: title.unwrap_or_else(|| self.kind.default_title().to_string()),
            message: self.message,
            duration: duration.unwrap_or(DEFAULT_DURATION),
            dismissible: dismissible.unwrap_or(true),
            is_modal: is_modal.unwrap_or(false),
            created_at: Utc::now(),
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_unique_within_same_millisecond() {
        let a = AlertId::generate();
        let b = AlertId::generate();
        assert_ne!(a, b);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_input_defaults() {
        let alert = AlertInput::new(AlertKind::default(), "hello").into_alert();
        assert_eq!(alert.kind, AlertKind::Info);
        assert_eq!(alert.title, "Info");
        assert_eq!(alert.duration, DEFAULT_DURATION);
        assert!(alert.dismissible);
        assert!(!alert.is_modal);
        assert_eq!(alert.category, AlertCategory::General);
    }

    #[test]
    fn test_options_override_defaults() {
        let alert = AlertInput::new(AlertKind::Error, "boom")
            .options(
                AlertOptions::default()
                    .title("Upload failed")
                    .duration(Duration::ZERO)
                    .dismissible(false),
            )
            .into_alert();
        assert_eq!(alert.title, "Upload failed");
        assert!(!alert.auto_dismisses());
        assert!(!alert.dismissible);
    }

    #[test]
    fn test_maintenance_requires_warning_kind() {
        let alert = AlertInput::new(AlertKind::Info, "x")
            .category(AlertCategory::Maintenance)
            .into_alert();
        assert!(!alert.is_maintenance());
    }

    #[test]
    fn test_alert_serializes_duration_as_millis() {
        let alert = AlertInput::new(AlertKind::Success, "saved").into_alert();
        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["duration"], 5000);
        assert_eq!(json["kind"], "success");
    }
}
