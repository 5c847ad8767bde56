use axum::routing::get;
use axum::Router;

use crate::handlers::settings;
use crate::state::AppState;

/// Routes mounted at `/settings`.
///
/// ```text
/// GET  /dimensions  -> get_dimensions
/// PUT  /dimensions  -> update_dimensions
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/dimensions",
        get(settings::get_dimensions).put(settings::update_dimensions),
    )
}
