//! Route definitions for job submission.

use axum::routing::post;
use axum::Router;

use crate::handlers::imagine;
use crate::state::AppState;

/// Routes mounted at `/imagine`.
///
/// ```text
/// POST /                                   -> submit_prompt
/// POST /{source_ref}/reroll                -> submit_reroll
/// POST /{source_ref}/variation/{index}     -> submit_variation
/// POST /{source_ref}/upscale/{index}       -> submit_upscale
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(imagine::submit_prompt))
        .route("/{source_ref}/reroll", post(imagine::submit_reroll))
        .route("/{source_ref}/variation/{index}", post(imagine::submit_variation))
        .route("/{source_ref}/upscale/{index}", post(imagine::submit_upscale))
}
