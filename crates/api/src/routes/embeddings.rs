use axum::routing::get;
use axum::Router;

use crate::handlers::embeddings;
use crate::state::AppState;

/// Routes mounted at `/embeddings`.
///
/// ```text
/// GET  /  -> list_embeddings
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(embeddings::list_embeddings))
}
