//! Update detector job.
//!
//! Polls the public status endpoint and turns it into banners:
//! 1. Skips the tick if the previous round trip is still in flight.
//! 2. Skips when nobody is signed in, or the session is an administrator.
//! 3. Shows nothing while maintenance is active.
//! 4. Raises the maintenance warning (deduplicated by the alert store).
//! 5. Announces a release once per release id, ever, via a modal alert and
//!    records the id in the seen-registry.
//!
//! Every failure is logged and treated as "nothing new this tick".

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::schedule::{spawn_recurring, PollHandle};
use crate::alerts::AlertStore;
use crate::api::StatusSource;
use crate::models::alert::{AlertCategory, AlertId, AlertInput, AlertKind, AlertOptions};
use crate::models::session::SessionHandle;
use crate::models::status::{ReleaseId, StatusPayload};
use crate::store::SeenRegistry;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_STARTUP_DELAY: Duration = Duration::from_secs(3);
pub const DEFAULT_MAINTENANCE_MESSAGE: &str =
    "Scheduled maintenance is coming up shortly. Please save your work.";
pub const DEFAULT_RELEASE_TITLE: &str = "What's New";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The previous tick's request had not completed.
    SkippedInFlight,
    /// No session, or an administrator session.
    SkippedIneligible,
    /// Network or decoding failure; nothing was shown.
    Failed,
    /// Maintenance is in effect; banners are suppressed.
    MaintenanceActive,
    Checked {
        maintenance_warning: bool,
        release_announced: bool,
    },
}

/// Clears the in-flight flag on every exit path, including cancellation.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct UpdateDetector {
    status: Arc<dyn StatusSource>,
    session: SessionHandle,
    alerts: AlertStore,
    seen: SeenRegistry,
    in_flight: AtomicBool,
    /// Held across check, insert and record so a manual trigger and a polled
    /// tick cannot both announce the same release.
    announcing: Mutex<()>,
    startup_delay: Duration,
    poll_interval: Duration,
}

impl UpdateDetector {
    pub fn new(
        status: Arc<dyn StatusSource>,
        session: SessionHandle,
        alerts: AlertStore,
        seen: SeenRegistry,
    ) -> Self {
        Self {
            status,
            session,
            alerts,
            seen,
            in_flight: AtomicBool::new(false),
            announcing: Mutex::new(()),
            startup_delay: DEFAULT_STARTUP_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_schedule(mut self, startup_delay: Duration, poll_interval: Duration) -> Self {
        self.startup_delay = startup_delay;
        self.poll_interval = poll_interval;
        self
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn try_acquire(&self) -> Option<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(&self.in_flight))
    }

    /// Run one check. Never fails; the outcome says what happened.
    pub async fn tick(&self) -> TickOutcome {
        let Some(_in_flight) = self.try_acquire() else {
            debug!("update_detector: previous check still in flight, skipping");
            return TickOutcome::SkippedInFlight;
        };

        match self.session.current().await {
            None => {
                debug!("update_detector: no session, skipping");
                return TickOutcome::SkippedIneligible;
            }
            Some(session) if session.is_admin() => {
                debug!(user = %session.username, "update_detector: admin session, skipping");
                return TickOutcome::SkippedIneligible;
            }
            Some(_) => {}
        }

        let payload = match self.status.fetch_status().await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "update_detector: status check failed");
                return TickOutcome::Failed;
            }
        };

        self.apply(&payload).await
    }

    async fn apply(&self, payload: &StatusPayload) -> TickOutcome {
        if payload.maintenance_active {
            info!("update_detector: maintenance active, suppressing banners");
            return TickOutcome::MaintenanceActive;
        }

        let maintenance_warning = payload.maintenance_warning
            && self
                .trigger_maintenance_warning(payload.maintenance_message.as_deref())
                .is_some();

        let release_announced = match payload.release() {
            Some((id, notes)) => {
                self.announce_release(id, payload.release_title.as_deref(), notes)
                    .await
            }
            None => false,
        };

        TickOutcome::Checked {
            maintenance_warning,
            release_announced,
        }
    }

    /// Raise the maintenance banner outside the polling cadence. Returns `None`
    /// when one is already showing.
    pub fn trigger_maintenance_warning(&self, message: Option<&str>) -> Option<AlertId> {
        let message = message
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MAINTENANCE_MESSAGE);
        let id = self
            .alerts
            .show_maintenance_warning(message, AlertOptions::default());
        if let Some(id) = id {
            info!(%id, "update_detector: maintenance warning shown");
        }
        id
    }

    /// Announce a release outside the polling cadence. Same once-per-id rule
    /// as the polled path.
    pub async fn trigger_release_announcement(
        &self,
        id: &ReleaseId,
        title: Option<&str>,
        notes: &str,
    ) -> bool {
        self.announce_release(id, title, notes).await
    }

    async fn announce_release(&self, id: &ReleaseId, title: Option<&str>, notes: &str) -> bool {
        let _announcing = self.announcing.lock().await;
        if self.seen.has_seen(id).await {
            debug!(release_id = %id, "update_detector: release already announced");
            return false;
        }

        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_RELEASE_TITLE);
        let Some(alert) = self.alerts.add(
            AlertInput::new(AlertKind::Info, notes)
                .category(AlertCategory::Release)
                .options(
                    AlertOptions::default()
                        .title(title)
                        .duration(Duration::ZERO)
                        .modal(true),
                ),
        ) else {
            warn!(release_id = %id, "update_detector: alert store disposed, release not announced");
            return false;
        };
        // Recorded whether or not anything is rendering the modal right now.
        self.seen.mark_seen(id).await;

        info!(release_id = %id, alert = %alert, "update_detector: release announced");
        true
    }

    /// Start polling: first check after the startup delay, then on the fixed
    /// interval. Dropping the handle stops it.
    pub fn spawn(self: &Arc<Self>) -> PollHandle {
        let detector = Arc::clone(self);
        spawn_recurring(
            "update_detector",
            self.startup_delay,
            self.poll_interval,
            move || {
                let detector = detector.clone();
                async move {
                    let outcome = detector.tick().await;
                    debug!(?outcome, "update_detector: tick complete");
                }
            },
        )
    }
}
