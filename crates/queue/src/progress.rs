//! Render progress polling for the in-flight job.
//!
//! [`ProgressReporter::start`] spawns a task that polls the backend at a
//! fixed interval and forwards each reading to the [`Notifier`]. The
//! returned [`ProgressHandle`] stops it. Every notification is delivered
//! while holding a gate that [`ProgressHandle::stop`] also takes, so once
//! `stop` returns no further progress can be reported for that job.

use std::sync::Arc;
use std::time::Duration;

use imagine_core::job::Job;
use imagine_core::render::RenderBackend;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::notifier::Notifier;

/// Default interval between progress polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Spawns one progress poller per rendering job.
#[derive(Clone)]
pub struct ProgressReporter {
    backend: Arc<dyn RenderBackend>,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
}

/// Stops the poller started for one job.
pub struct ProgressHandle {
    cancel: CancellationToken,
    stopped: Arc<Mutex<bool>>,
    task: JoinHandle<()>,
}

impl ProgressReporter {
    pub fn new(backend: Arc<dyn RenderBackend>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            backend,
            notifier,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start polling for `job`. The first poll happens one interval after
    /// the start.
    pub fn start(&self, job: Job) -> ProgressHandle {
        let cancel = CancellationToken::new();
        let stopped = Arc::new(Mutex::new(false));

        let task = tokio::spawn(poll_loop(
            Arc::clone(&self.backend),
            Arc::clone(&self.notifier),
            self.interval,
            job,
            cancel.clone(),
            Arc::clone(&stopped),
        ));

        ProgressHandle {
            cancel,
            stopped,
            task,
        }
    }
}

impl ProgressHandle {
    /// Stop polling. Waits for a notification already being delivered,
    /// then discards anything still in flight.
    pub async fn stop(self) {
        self.cancel.cancel();
        *self.stopped.lock().await = true;

        if let Err(e) = self.task.await {
            if e.is_panic() {
                tracing::error!(error = %e, "Progress poller panicked");
            }
        }
    }
}

async fn poll_loop(
    backend: Arc<dyn RenderBackend>,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
    job: Job,
    cancel: CancellationToken,
    stopped: Arc<Mutex<bool>>,
) {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let reading = tokio::select! {
            _ = cancel.cancelled() => break,
            reading = backend.progress() => reading,
        };

        let progress = match reading {
            Ok(progress) => progress,
            Err(e) => {
                tracing::debug!(job_id = %job.id, error = %e, "Progress poll failed");
                continue;
            }
        };

        let gate = stopped.lock().await;
        if *gate {
            break;
        }
        notifier.on_progress(&job, progress).await;
    }
}
