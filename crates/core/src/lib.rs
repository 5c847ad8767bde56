//! Domain types and pure logic for the single-capacity image generation
//! scheduler.
//!
//! Everything here is independent of the chat front door and of the
//! concrete render backend: jobs and their validation, default dimensions,
//! the bounded result history, derived-job resolution, and the
//! [`RenderBackend`](render::RenderBackend) seam.

pub mod aspect_ratio;
pub mod dimensions;
pub mod error;
pub mod history;
pub mod job;
pub mod options;
pub mod render;
pub mod resolve;
pub mod statistics;
pub mod types;
