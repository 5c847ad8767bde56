//! The single render worker.
//!
//! Takes jobs from the [`JobQueue`] one at a time, resolves derived jobs
//! against [`History`], renders through the [`RenderBackend`] and reports
//! through the [`Notifier`]. The next job is only taken after the current
//! one reached a terminal state, so the backend never sees two renders at
//! once. A failing job is reported and the loop moves on; nothing is
//! retried.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use imagine_core::error::{BackendError, CoreError};
use imagine_core::history::{History, HistoryEntry};
use imagine_core::job::{Job, JobKind};
use imagine_core::render::{GenerationResult, RenderBackend, UpscaleRequest};
use imagine_core::resolve::{resolve, RenderPlan};
use imagine_core::statistics::{ProcessingTime, StatisticsRepo};
use tokio_util::sync::CancellationToken;

use crate::notifier::Notifier;
use crate::progress::ProgressReporter;
use crate::queue::JobQueue;

/// Background render worker.
pub struct Worker {
    queue: Arc<JobQueue>,
    history: Arc<History>,
    backend: Arc<dyn RenderBackend>,
    notifier: Arc<dyn Notifier>,
    statistics: Arc<dyn StatisticsRepo>,
    reporter: ProgressReporter,
}

impl Worker {
    pub fn new(
        queue: Arc<JobQueue>,
        history: Arc<History>,
        backend: Arc<dyn RenderBackend>,
        notifier: Arc<dyn Notifier>,
        statistics: Arc<dyn StatisticsRepo>,
    ) -> Self {
        let reporter = ProgressReporter::new(Arc::clone(&backend), Arc::clone(&notifier));
        Self {
            queue,
            history,
            backend,
            notifier,
            statistics,
            reporter,
        }
    }

    /// Override the progress poll interval.
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.reporter = self.reporter.with_interval(interval);
        self
    }

    /// Run the worker loop until the cancellation token is triggered.
    ///
    /// A job already being rendered is finished before the loop exits.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            progress_interval_ms = self.reporter.interval().as_millis() as u64,
            "Render worker started",
        );

        loop {
            let job = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(pending = self.queue.pending_len(), "Render worker shutting down");
                    break;
                }
                job = self.queue.next() => job,
            };
            self.process(job).await;
        }
    }

    /// Take a single job to a terminal state.
    pub async fn process(&self, job: Job) {
        tracing::info!(job_id = %job.id, kind = job.kind.as_str(), "Job started");

        let plan = match resolve(&job, &self.history) {
            Ok(plan) => plan,
            Err(e) => {
                self.notifier.on_failed(&job, &e).await;
                return;
            }
        };

        let started = Instant::now();
        let progress = self.reporter.start(job.clone());
        let outcome = self.render(&job, &plan).await;
        progress.stop().await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(result) => {
                self.remember(&job, &plan, &result);
                self.notifier.on_delivered(&job, &result).await;
                self.record_statistics(&job, elapsed).await;
            }
            Err(e) => {
                self.notifier.on_failed(&job, &CoreError::from(e)).await;
            }
        }
    }

    async fn render(&self, job: &Job, plan: &RenderPlan) -> Result<GenerationResult, BackendError> {
        let result_ref = job.history_key().clone();

        match plan {
            RenderPlan::Generate(request) => {
                let output = self.backend.text_to_image(request).await?;
                Ok(GenerationResult::from_output(output, result_ref))
            }
            RenderPlan::Upscale(request) => {
                let output = self.backend.text_to_image(request).await?;
                let image = output.images.first().cloned().ok_or_else(|| {
                    BackendError::InvalidResponse("no image to upscale".to_string())
                })?;

                let upscaled = self
                    .backend
                    .upscale_image(&UpscaleRequest::with_defaults(image))
                    .await?;

                Ok(GenerationResult {
                    images: vec![upscaled.image],
                    seeds: output.seeds.into_iter().take(1).collect(),
                    subseeds: output.subseeds.into_iter().take(1).collect(),
                    model: output.model,
                    source_ref: result_ref,
                })
            }
        }
    }

    /// Store a successful result for later derivations.
    ///
    /// An upscale only overwrites history when it names its own result
    /// ref; otherwise the multi-image source entry is kept so its other
    /// images stay addressable.
    fn remember(&self, job: &Job, plan: &RenderPlan, result: &GenerationResult) {
        if job.kind == JobKind::Upscale && job.result_ref.is_none() {
            return;
        }
        self.history.record(
            job.history_key().clone(),
            HistoryEntry {
                options: plan.request().options.clone(),
                result: result.clone(),
            },
        );
    }

    async fn record_statistics(&self, job: &Job, elapsed: Duration) {
        let Some(member_id) = job.requested_by.clone() else {
            return;
        };

        let record = ProcessingTime {
            job_id: job.id,
            member_id,
            time_ms: i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX),
            created_at: Utc::now(),
        };
        if let Err(e) = self.statistics.add_processing_time(record).await {
            tracing::error!(job_id = %job.id, error = %e, "Failed to record processing time");
        }
    }
}
