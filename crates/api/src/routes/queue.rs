use axum::routing::get;
use axum::Router;

use crate::handlers::queue;
use crate::state::AppState;

/// Routes mounted at `/queue`.
///
/// ```text
/// GET  /         -> get_queue_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(queue::get_queue_status))
}
