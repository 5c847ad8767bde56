//! FIFO buffer of pending jobs.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use imagine_core::error::CoreError;
use imagine_core::job::Job;
use tokio::sync::Notify;

/// Unbounded FIFO shared by every submitter and the single worker.
///
/// Insertion and position computation happen under one lock, so
/// concurrent submitters always observe distinct, gap-free positions.
#[derive(Debug, Default)]
pub struct JobQueue {
    pending: Mutex<VecDeque<Job>>,
    available: Notify,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and enqueue `job`.
    ///
    /// Returns its 1-based position: the number of pending jobs at or
    /// ahead of it, the job itself included.
    pub fn submit(&self, job: Job) -> Result<usize, CoreError> {
        job.validate()?;

        let job_id = job.id;
        let kind = job.kind;
        let position = {
            let mut pending = self.lock();
            pending.push_back(job);
            pending.len()
        };
        self.available.notify_one();

        tracing::info!(job_id = %job_id, kind = kind.as_str(), position, "Job queued");
        Ok(position)
    }

    /// Number of jobs waiting to be picked up.
    pub fn pending_len(&self) -> usize {
        self.lock().len()
    }

    /// Take the oldest pending job, if any.
    pub fn try_next(&self) -> Option<Job> {
        self.lock().pop_front()
    }

    /// Wait for and take the oldest pending job.
    ///
    /// Cancel-safe: dropping the future before it resolves loses no job.
    pub async fn next(&self) -> Job {
        loop {
            if let Some(job) = self.try_next() {
                return job;
            }
            self.available.notified().await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Job>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use assert_matches::assert_matches;
    use imagine_core::dimensions::PRESET_512;
    use imagine_core::options::GenerationOptions;
    use imagine_core::types::SourceRef;

    use super::*;

    fn fresh(prompt: &str) -> Job {
        Job::fresh(SourceRef::from("msg"), GenerationOptions::new(prompt, PRESET_512)).unwrap()
    }

    #[test]
    fn positions_count_from_one() {
        let queue = JobQueue::new();
        assert_eq!(queue.submit(fresh("a")).unwrap(), 1);
        assert_eq!(queue.submit(fresh("b")).unwrap(), 2);
        assert_eq!(queue.pending_len(), 2);
    }

    #[test]
    fn jobs_leave_in_submission_order() {
        let queue = JobQueue::new();
        queue.submit(fresh("first")).unwrap();
        queue.submit(fresh("second")).unwrap();

        let first = queue.try_next().unwrap();
        assert_eq!(first.options.unwrap().prompt, "first");
        assert_eq!(queue.pending_len(), 1);
    }

    #[test]
    fn invalid_job_not_queued() {
        let queue = JobQueue::new();
        let mut job = fresh("a");
        job.options = None;

        assert_matches!(queue.submit(job), Err(CoreError::Validation(_)));
        assert_eq!(queue.pending_len(), 0);
    }

    #[tokio::test]
    async fn next_wakes_on_submit() {
        let queue = Arc::new(JobQueue::new());
        let waiter = tokio::spawn({
            let queue = Arc::clone(&queue);
            async move { queue.next().await }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        queue.submit(fresh("late")).unwrap();

        let job = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(job.options.unwrap().prompt, "late");
    }
}
