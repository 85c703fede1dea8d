//! Recurring background jobs.
//!
//! A job runs once after `first_run`, then every `period` measured from the
//! moment it was spawned. Each run is its own task, so a slow run does not hold
//! back the schedule; jobs that must not overlap guard themselves. Dropping the
//! returned `PollHandle` aborts the schedule together with any run still in
//! flight.

use std::future::Future;
use std::time::Duration;

use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error};

pub struct PollHandle {
    job: &'static str,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn job(&self) -> &'static str {
        self.job
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the job. Equivalent to dropping the handle.
    pub fn stop(self) {}
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
        debug!(job = self.job, "job stopped");
    }
}

/// Spawn a recurring job. Must be called from within a Tokio runtime.
pub fn spawn_recurring<F, Fut>(
    job: &'static str,
    first_run: Duration,
    period: Duration,
    mut run: F,
) -> PollHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let task = tokio::spawn(async move {
        // Owned here so aborting the schedule also aborts in-flight runs.
        let mut runs = JoinSet::new();
        let start = Instant::now();

        let first = time::sleep_until(start + first_run);
        tokio::pin!(first);
        let mut first_pending = true;

        let mut interval = time::interval_at(start + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        debug!(job, ?first_run, ?period, "job scheduled");
        loop {
            tokio::select! {
                _ = &mut first, if first_pending => first_pending = false,
                _ = interval.tick() => {}
                Some(done) = runs.join_next(), if !runs.is_empty() => {
                    if let Err(e) = done {
                        if e.is_panic() {
                            error!(job, "job run panicked");
                        }
                    }
                    continue;
                }
            }
            runs.spawn(run());
        }
    });

    PollHandle { job, task }
}
