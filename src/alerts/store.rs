//! Process-wide alert queue.
//!
//! One `AlertStore` is wired per session and shared by cloning. All operations
//! are synchronous; the only scheduled work is the auto-dismiss timer spawned
//! for alerts with a non-zero duration. Timer tasks hold a weak reference, and
//! every pending timer is aborted on `dispose()` or when the last handle drops,
//! so nothing fires into a store that has been torn down.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::models::alert::{Alert, AlertCategory, AlertId, AlertInput, AlertKind, AlertOptions};

/// Default title for maintenance banners.
pub const MAINTENANCE_TITLE: &str = "Scheduled Maintenance";

/// Performs the hard reload that follows "apply update now".
pub trait Reloader: Send + Sync {
    fn reload(&self);
}

/// Default reloader: the CLI has no page to reload, so it only records the request.
pub struct LogReloader;

impl Reloader for LogReloader {
    fn reload(&self) {
        info!("alerts: reload requested to apply update");
    }
}

#[derive(Default)]
struct Inner {
    alerts: Vec<Alert>,
    timers: HashMap<AlertId, JoinHandle<()>>,
    disposed: bool,
}

impl Inner {
    fn abort_timers(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.abort();
        }
    }
}

struct Shared {
    inner: Mutex<Inner>,
    snapshots: watch::Sender<Vec<Alert>>,
    reloader: Arc<dyn Reloader>,
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.inner
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .abort_timers();
    }
}

/// Shared, cheaply-cloneable alert queue.
#[derive(Clone)]
pub struct AlertStore {
    shared: Arc<Shared>,
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertStore {
    pub fn new() -> Self {
        Self::with_reloader(Arc::new(LogReloader))
    }

    pub fn with_reloader(reloader: Arc<dyn Reloader>) -> Self {
        let (snapshots, _) = watch::channel(Vec::new());
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner::default()),
                snapshots,
                reloader,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, inner: &Inner) {
        self.shared.snapshots.send_replace(inner.alerts.clone());
    }

    /// Insert an alert, applying defaults. Alerts with a non-zero duration are
    /// removed automatically once it elapses. Returns `None` once the store
    /// has been disposed.
    pub fn add(&self, input: AlertInput) -> Option<AlertId> {
        let alert = input.into_alert();
        let id = alert.id;
        let mut inner = self.lock();
        self.insert(&mut inner, alert).then_some(id)
    }

    /// Insert only if no active alert matches `conflicts`. The check and the
    /// insert happen under the same lock.
    fn add_unless(&self, input: AlertInput, conflicts: impl Fn(&Alert) -> bool) -> Option<AlertId> {
        let mut inner = self.lock();
        if let Some(existing) = inner.alerts.iter().find(|&a| conflicts(a)) {
            debug!(existing = %existing.id, kind = %existing.kind, "alerts: duplicate suppressed");
            return None;
        }
        let alert = input.into_alert();
        let id = alert.id;
        self.insert(&mut inner, alert).then_some(id)
    }

    /// Returns whether the alert was stored.
    fn insert(&self, inner: &mut Inner, alert: Alert) -> bool {
        if inner.disposed {
            warn!(id = %alert.id, "alerts: store disposed, dropping alert");
            return false;
        }
        if alert.auto_dismisses() {
            if let Some(timer) = self.schedule_dismiss(alert.id, alert.duration) {
                inner.timers.insert(alert.id, timer);
            }
        }
        debug!(id = %alert.id, kind = %alert.kind, modal = alert.is_modal, "alerts: added");
        inner.alerts.push(alert);
        self.publish(inner);
        true
    }

    fn schedule_dismiss(&self, id: AlertId, after: Duration) -> Option<JoinHandle<()>> {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(rt) => rt,
            Err(_) => {
                warn!(%id, "alerts: no runtime available, alert will not auto-dismiss");
                return None;
            }
        };
        let store: Weak<Shared> = Arc::downgrade(&self.shared);
        Some(runtime.spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(shared) = store.upgrade() {
                AlertStore { shared }.expire(id);
            }
        }))
    }

    /// Timer path: the timer's own handle is dropped rather than aborted.
    fn expire(&self, id: AlertId) {
        let mut inner = self.lock();
        inner.timers.remove(&id);
        if Self::take(&mut inner, id) {
            debug!(%id, "alerts: auto-dismissed");
            self.publish(&inner);
        }
    }

    fn take(inner: &mut Inner, id: AlertId) -> bool {
        let before = inner.alerts.len();
        inner.alerts.retain(|a| a.id != id);
        inner.alerts.len() != before
    }

    /// Remove an alert. Unknown ids are ignored. Returns whether anything was removed.
    pub fn remove(&self, id: AlertId) -> bool {
        let mut inner = self.lock();
        if let Some(timer) = inner.timers.remove(&id) {
            timer.abort();
        }
        let removed = Self::take(&mut inner, id);
        if removed {
            self.publish(&inner);
        }
        removed
    }

    pub fn clear_all(&self) {
        let mut inner = self.lock();
        inner.abort_timers();
        inner.alerts.clear();
        self.publish(&inner);
    }

    /// Insertion-ordered snapshot of every active alert.
    pub fn list_active(&self) -> Vec<Alert> {
        self.lock().alerts.clone()
    }

    pub fn modals(&self) -> Vec<Alert> {
        self.lock().alerts.iter().filter(|a| a.is_modal).cloned().collect()
    }

    pub fn toasts(&self) -> Vec<Alert> {
        self.lock().alerts.iter().filter(|a| !a.is_modal).cloned().collect()
    }

    pub fn get(&self, id: AlertId) -> Option<Alert> {
        self.lock().alerts.iter().find(|a| a.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of auto-dismiss timers still pending.
    pub fn pending_timers(&self) -> usize {
        self.lock().timers.len()
    }

    /// Receives a fresh snapshot after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Alert>> {
        self.shared.snapshots.subscribe()
    }

    /// Show the "update available" banner. No-op while one is already active.
    pub fn show_update(&self, message: impl Into<String>, options: AlertOptions) -> Option<AlertId> {
        let options = AlertOptions {
            duration: options.duration.or(Some(Duration::ZERO)),
            ..options
        };
        self.add_unless(
            AlertInput::new(AlertKind::Update, message).options(options),
            |a| a.kind == AlertKind::Update,
        )
    }

    /// Show the maintenance banner. No-op while one is already active.
    pub fn show_maintenance_warning(
        &self,
        message: impl Into<String>,
        options: AlertOptions,
    ) -> Option<AlertId> {
        let options = AlertOptions {
            title: options.title.or_else(|| Some(MAINTENANCE_TITLE.to_string())),
            duration: options.duration.or(Some(Duration::ZERO)),
            ..options
        };
        self.add_unless(
            AlertInput::new(AlertKind::Warning, message)
                .category(AlertCategory::Maintenance)
                .options(options),
            Alert::is_maintenance,
        )
    }

    pub fn show_info(&self, message: impl Into<String>, options: AlertOptions) -> Option<AlertId> {
        self.add(AlertInput::new(AlertKind::Info, message).options(options))
    }

    pub fn show_success(&self, message: impl Into<String>, options: AlertOptions) -> Option<AlertId> {
        self.add(AlertInput::new(AlertKind::Success, message).options(options))
    }

    pub fn show_warning(&self, message: impl Into<String>, options: AlertOptions) -> Option<AlertId> {
        self.add(AlertInput::new(AlertKind::Warning, message).options(options))
    }

    pub fn show_error(&self, message: impl Into<String>, options: AlertOptions) -> Option<AlertId> {
        self.add(AlertInput::new(AlertKind::Error, message).options(options))
    }

    /// Remove every `update` alert. Returns how many were removed.
    pub fn clear_updates(&self) -> usize {
        let mut inner = self.lock();
        let ids: Vec<AlertId> = inner
            .alerts
            .iter()
            .filter(|a| a.kind == AlertKind::Update)
            .map(|a| a.id)
            .collect();
        for id in &ids {
            if let Some(timer) = inner.timers.remove(id) {
                timer.abort();
            }
        }
        inner.alerts.retain(|a| a.kind != AlertKind::Update);
        if !ids.is_empty() {
            self.publish(&inner);
        }
        ids.len()
    }

    /// Clear pending update banners, then hand off to the reloader.
    pub fn apply_update_now(&self) {
        let cleared = self.clear_updates();
        info!(cleared, "alerts: applying update");
        self.shared.reloader.reload();
    }

    /// Tear the store down: drop every alert and abort every pending timer.
    /// Later inserts are ignored.
    pub fn dispose(&self) {
        let mut inner = self.lock();
        inner.disposed = true;
        inner.abort_timers();
        inner.alerts.clear();
        self.publish(&inner);
    }
}
