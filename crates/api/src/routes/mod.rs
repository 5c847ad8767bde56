pub mod embeddings;
pub mod health;
pub mod imagine;
pub mod queue;
pub mod settings;
pub mod stats;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                        WebSocket job events
///
/// /imagine                                   submit a prompt (POST)
/// /imagine/{source_ref}/reroll               reroll a result (POST)
/// /imagine/{source_ref}/variation/{index}    variations of one image (POST)
/// /imagine/{source_ref}/upscale/{index}      upscale one image (POST)
///
/// /queue                                     pending job count
///
/// /settings/dimensions                       get, update default dimensions
///
/// /stats/{member_id}                         usage statistics
///
/// /embeddings                                backend embedding names
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/imagine", imagine::router())
        .nest("/queue", queue::router())
        .nest("/settings", settings::router())
        .nest("/stats", stats::router())
        .nest("/embeddings", embeddings::router())
}
