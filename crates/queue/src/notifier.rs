//! Outward job notifications.
//!
//! The worker reports through the [`Notifier`] trait. [`BroadcastNotifier`]
//! is the in-process implementation: it turns each callback into a
//! serializable [`JobEvent`] and fans it out over a
//! `tokio::sync::broadcast` channel, so any number of front-door
//! connections can follow the queue.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use imagine_core::error::CoreError;
use imagine_core::job::{Job, JobKind};
use imagine_core::render::{GenerationResult, RenderProgress};
use imagine_core::types::{JobId, SourceRef};
use serde::Serialize;
use tokio::sync::broadcast;

/// Receives the outcome and progress of every job that leaves the queue.
///
/// Each job gets exactly one of [`on_delivered`](Notifier::on_delivered)
/// or [`on_failed`](Notifier::on_failed). [`on_progress`](Notifier::on_progress)
/// is only called before that terminal callback.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn on_delivered(&self, job: &Job, result: &GenerationResult);

    async fn on_failed(&self, job: &Job, error: &CoreError);

    async fn on_progress(&self, job: &Job, progress: RenderProgress);
}

// ---------------------------------------------------------------------------
// JobEvent
// ---------------------------------------------------------------------------

/// A notification as published to subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    Progress {
        job_id: JobId,
        source_ref: SourceRef,
        /// Completion in percent, `0..=100`.
        percent: f64,
        eta_seconds: f64,
        timestamp: DateTime<Utc>,
    },
    Delivered {
        job_id: JobId,
        kind: JobKind,
        source_ref: SourceRef,
        /// History key the result was stored under.
        result_ref: SourceRef,
        result: GenerationResult,
        timestamp: DateTime<Utc>,
    },
    Failed {
        job_id: JobId,
        kind: JobKind,
        source_ref: SourceRef,
        error: String,
        code: &'static str,
        timestamp: DateTime<Utc>,
    },
}

impl JobEvent {
    pub fn job_id(&self) -> JobId {
        match self {
            JobEvent::Progress { job_id, .. }
            | JobEvent::Delivered { job_id, .. }
            | JobEvent::Failed { job_id, .. } => *job_id,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobEvent::Progress { .. })
    }

    fn progress(job: &Job, progress: RenderProgress) -> Self {
        JobEvent::Progress {
            job_id: job.id,
            source_ref: job.source_ref.clone(),
            percent: (progress.fraction * 100.0).round(),
            eta_seconds: progress.eta_seconds,
            timestamp: Utc::now(),
        }
    }

    fn delivered(job: &Job, result: &GenerationResult) -> Self {
        JobEvent::Delivered {
            job_id: job.id,
            kind: job.kind,
            source_ref: job.source_ref.clone(),
            result_ref: job.history_key().clone(),
            result: result.clone(),
            timestamp: Utc::now(),
        }
    }

    fn failed(job: &Job, error: &CoreError) -> Self {
        JobEvent::Failed {
            job_id: job.id,
            kind: job.kind,
            source_ref: job.source_ref.clone(),
            error: error.to_string(),
            code: error.code(),
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// BroadcastNotifier
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// Publishes [`JobEvent`]s to every current subscriber.
///
/// When the buffer is full, the oldest un-consumed events are dropped and
/// slow receivers observe a `RecvError::Lagged`.
pub struct BroadcastNotifier {
    sender: broadcast::Sender<JobEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.sender.subscribe()
    }

    fn publish(&self, event: JobEvent) {
        // A send error only means there are no subscribers.
        let _ = self.sender.send(event);
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl Notifier for BroadcastNotifier {
    async fn on_delivered(&self, job: &Job, result: &GenerationResult) {
        tracing::info!(
            job_id = %job.id,
            kind = job.kind.as_str(),
            images = result.images.len(),
            "Job delivered",
        );
        self.publish(JobEvent::delivered(job, result));
    }

    async fn on_failed(&self, job: &Job, error: &CoreError) {
        tracing::warn!(
            job_id = %job.id,
            kind = job.kind.as_str(),
            error = %error,
            "Job failed",
        );
        self.publish(JobEvent::failed(job, error));
    }

    async fn on_progress(&self, job: &Job, progress: RenderProgress) {
        self.publish(JobEvent::progress(job, progress));
    }
}

#[cfg(test)]
mod tests {
    use imagine_core::error::ResolutionError;

    use super::*;

    fn reroll() -> Job {
        Job::reroll(SourceRef::from("msg-1")).unwrap()
    }

    #[tokio::test]
    async fn failure_published_with_error_code() {
        let notifier = BroadcastNotifier::default();
        let mut rx = notifier.subscribe();
        let job = reroll();

        let error = CoreError::from(ResolutionError::NotFound {
            source_ref: job.source_ref.clone(),
        });
        notifier.on_failed(&job, &error).await;

        let event = rx.recv().await.unwrap();
        assert!(event.is_terminal());
        assert_eq!(event.job_id(), job.id);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "failed");
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["kind"], "reroll");
    }

    #[tokio::test]
    async fn progress_reported_in_percent() {
        let notifier = BroadcastNotifier::default();
        let mut rx = notifier.subscribe();

        notifier
            .on_progress(
                &reroll(),
                RenderProgress {
                    fraction: 0.456,
                    eta_seconds: 3.0,
                },
            )
            .await;

        let event = rx.recv().await.unwrap();
        assert!(!event.is_terminal());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "progress");
        assert_eq!(json["percent"], 46.0);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_silent() {
        let notifier = BroadcastNotifier::default();
        notifier
            .on_progress(
                &reroll(),
                RenderProgress {
                    fraction: 0.1,
                    eta_seconds: 1.0,
                },
            )
            .await;
    }
}
