//! WebSocket stream of job events.

mod handler;

pub use handler::ws_handler;
