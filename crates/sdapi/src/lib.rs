//! Stable Diffusion WebUI REST client.
//!
//! Provides typed request/response bodies for the `/sdapi/v1` endpoints,
//! an HTTP client built on [`reqwest`], and the
//! [`RenderBackend`](imagine_core::render::RenderBackend) implementation
//! the queue worker renders through.

pub mod api;
pub mod config;
pub mod messages;
