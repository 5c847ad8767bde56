use std::sync::Arc;

use imagine_core::dimensions::DefaultsStore;
use imagine_core::history::History;
use imagine_core::render::RenderBackend;
use imagine_core::statistics::{InMemoryStatisticsRepo, StatisticsRepo};
use imagine_queue::notifier::BroadcastNotifier;
use imagine_queue::queue::JobQueue;
use imagine_queue::worker::Worker;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Pending jobs, shared with the render worker.
    pub queue: Arc<JobQueue>,
    /// Latest result per source reference, written by the worker.
    pub history: Arc<History>,
    /// Default dimensions for new prompts.
    pub defaults: Arc<DefaultsStore>,
    /// Render backend (generation, progress, embeddings).
    pub backend: Arc<dyn RenderBackend>,
    /// Job event fan-out for WebSocket clients.
    pub notifier: Arc<BroadcastNotifier>,
    /// Per-member usage statistics.
    pub statistics: Arc<dyn StatisticsRepo>,
}

impl AppState {
    /// State with empty history, 512x512 defaults and in-memory statistics.
    pub fn new(backend: Arc<dyn RenderBackend>, history: History) -> Self {
        Self {
            queue: Arc::new(JobQueue::new()),
            history: Arc::new(history),
            defaults: Arc::new(DefaultsStore::default()),
            backend,
            notifier: Arc::new(BroadcastNotifier::default()),
            statistics: Arc::new(InMemoryStatisticsRepo::new()),
        }
    }

    /// The render worker consuming this state's queue.
    pub fn worker(&self) -> Worker {
        Worker::new(
            Arc::clone(&self.queue),
            Arc::clone(&self.history),
            Arc::clone(&self.backend),
            self.notifier.clone(),
            Arc::clone(&self.statistics),
        )
    }
}
