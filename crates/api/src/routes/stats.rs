use axum::routing::get;
use axum::Router;

use crate::handlers::stats;
use crate::state::AppState;

/// Routes mounted at `/stats`.
///
/// ```text
/// GET  /{member_id}  -> get_member_stats
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{member_id}", get(stats::get_member_stats))
}
