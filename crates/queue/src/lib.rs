//! The single-worker generation queue.
//!
//! [`JobQueue`](queue::JobQueue) accepts jobs from any number of
//! submitters, [`Worker`](worker::Worker) renders them one at a time
//! against a [`RenderBackend`](imagine_core::render::RenderBackend), and
//! [`ProgressReporter`](progress::ProgressReporter) streams render progress
//! to a [`Notifier`](notifier::Notifier) while a job is in flight.

pub mod config;
pub mod notifier;
pub mod progress;
pub mod queue;
pub mod worker;
