//! Shared doubles for queue integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use imagine_core::dimensions::PRESET_512;
use imagine_core::error::{BackendError, CoreError};
use imagine_core::history::{History, HistoryEntry};
use imagine_core::job::Job;
use imagine_core::options::GenerationOptions;
use imagine_core::render::{
    GenerationResult, RenderBackend, RenderProgress, TextToImageOutput, TextToImageRequest,
    UpscaleRequest, UpscaledImage,
};
use imagine_core::statistics::InMemoryStatisticsRepo;
use imagine_core::types::{JobId, SourceRef};
use imagine_queue::notifier::Notifier;
use imagine_queue::queue::JobQueue;
use imagine_queue::worker::Worker;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Backend double
// ---------------------------------------------------------------------------

/// Backend that renders after a delay and flags overlapping calls.
#[derive(Default)]
pub struct FakeBackend {
    pub render_delay: Duration,
    /// Scripted outcomes for `text_to_image`; empty means success.
    failures: Mutex<VecDeque<bool>>,
    in_flight: AtomicBool,
    pub overlapped: AtomicBool,
    pub text_to_image_calls: AtomicUsize,
    pub upscale_calls: AtomicUsize,
    pub requests: Mutex<Vec<TextToImageRequest>>,
}

impl FakeBackend {
    pub fn with_delay(render_delay: Duration) -> Self {
        Self {
            render_delay,
            ..Self::default()
        }
    }

    /// Queue the outcomes of the next `text_to_image` calls, `true` meaning
    /// the call fails.
    pub fn script(&self, outcomes: &[bool]) {
        self.failures.lock().unwrap().extend(outcomes.iter().copied());
    }

    pub fn calls(&self) -> usize {
        self.text_to_image_calls.load(Ordering::SeqCst) + self.upscale_calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        tokio::time::sleep(self.render_delay).await;
        self.in_flight.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl RenderBackend for FakeBackend {
    async fn text_to_image(
        &self,
        request: &TextToImageRequest,
    ) -> Result<TextToImageOutput, BackendError> {
        self.text_to_image_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        self.enter().await;

        let fail = self.failures.lock().unwrap().pop_front().unwrap_or(false);
        if fail {
            return Err(BackendError::Status {
                status: 500,
                body: "CUDA out of memory".to_string(),
            });
        }

        let count = request.options.image_count() as i64;
        Ok(TextToImageOutput {
            images: (0..count).map(|i| format!("image-{i}")).collect(),
            seeds: (0..count).map(|i| 100 + i).collect(),
            subseeds: (0..count).map(|i| 200 + i).collect(),
            model: "Model hash: abc123, Model: fake".to_string(),
        })
    }

    async fn upscale_image(&self, request: &UpscaleRequest) -> Result<UpscaledImage, BackendError> {
        self.upscale_calls.fetch_add(1, Ordering::SeqCst);
        self.enter().await;
        Ok(UpscaledImage {
            image: format!("upscaled-{}", request.image),
        })
    }

    async fn progress(&self) -> Result<RenderProgress, BackendError> {
        Ok(RenderProgress {
            fraction: 0.5,
            eta_seconds: 1.0,
        })
    }

    async fn embeddings(&self) -> Result<Vec<String>, BackendError> {
        Ok(vec!["easynegative".to_string()])
    }
}

// ---------------------------------------------------------------------------
// Notifier double
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Event {
    Delivered(JobId, GenerationResult),
    Failed(JobId, &'static str),
    Progress(JobId),
}

impl Event {
    pub fn job_id(&self) -> JobId {
        match self {
            Event::Delivered(id, _) | Event::Failed(id, _) | Event::Progress(id) => *id,
        }
    }
}

/// Records every callback in order and forwards terminal ones to a channel.
pub struct RecordingNotifier {
    pub events: Mutex<Vec<Event>>,
    terminal: mpsc::UnboundedSender<Event>,
}

impl RecordingNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (terminal, rx) = mpsc::unbounded_channel();
        (
            Self {
                events: Mutex::new(Vec::new()),
                terminal,
            },
            rx,
        )
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: Event, terminal: bool) {
        self.events.lock().unwrap().push(event.clone());
        if terminal {
            let _ = self.terminal.send(event);
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn on_delivered(&self, job: &Job, result: &GenerationResult) {
        self.push(Event::Delivered(job.id, result.clone()), true);
    }

    async fn on_failed(&self, job: &Job, error: &CoreError) {
        self.push(Event::Failed(job.id, error.code()), true);
    }

    async fn on_progress(&self, job: &Job, _progress: RenderProgress) {
        self.push(Event::Progress(job.id), false);
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub queue: Arc<JobQueue>,
    pub history: Arc<History>,
    pub backend: Arc<FakeBackend>,
    pub notifier: Arc<RecordingNotifier>,
    pub statistics: Arc<InMemoryStatisticsRepo>,
    pub terminal: mpsc::UnboundedReceiver<Event>,
    pub cancel: CancellationToken,
    worker: Option<Worker>,
}

impl Harness {
    pub fn new(backend: FakeBackend) -> Self {
        let queue = Arc::new(JobQueue::new());
        let history = Arc::new(History::default());
        let backend = Arc::new(backend);
        let (notifier, terminal) = RecordingNotifier::new();
        let notifier = Arc::new(notifier);
        let statistics = Arc::new(InMemoryStatisticsRepo::new());

        let worker = Worker::new(
            Arc::clone(&queue),
            Arc::clone(&history),
            backend.clone(),
            notifier.clone(),
            statistics.clone(),
        )
        .with_progress_interval(Duration::from_millis(5));

        Self {
            queue,
            history,
            backend,
            notifier,
            statistics,
            terminal,
            cancel: CancellationToken::new(),
            worker: Some(worker),
        }
    }

    /// Spawn the worker loop. Only the first call has an effect.
    pub fn start(&mut self) -> Option<tokio::task::JoinHandle<()>> {
        let worker = self.worker.take()?;
        let cancel = self.cancel.clone();
        Some(tokio::spawn(async move { worker.run(cancel).await }))
    }

    /// Wait for the next terminal notification.
    pub async fn next_terminal(&mut self) -> Event {
        tokio::time::timeout(Duration::from_secs(5), self.terminal.recv())
            .await
            .expect("timed out waiting for a terminal notification")
            .expect("notifier dropped")
    }

    /// Store a finished result under `source` with the given seeds.
    pub fn seed_history(&self, source: &str, seeds: &[i64]) {
        let mut options = GenerationOptions::new("a lighthouse at dusk", PRESET_512);
        options.seed = seeds[0];
        self.history.record(
            SourceRef::from(source),
            HistoryEntry {
                options,
                result: GenerationResult {
                    images: seeds.iter().map(|s| format!("stored-{s}")).collect(),
                    seeds: seeds.to_vec(),
                    subseeds: seeds.iter().map(|s| s + 1).collect(),
                    model: String::new(),
                    source_ref: SourceRef::from(source),
                },
            },
        );
    }
}

pub fn fresh_job(source: &str, prompt: &str) -> Job {
    Job::fresh(SourceRef::from(source), GenerationOptions::new(prompt, PRESET_512)).unwrap()
}
