use axum::extract::State;
use axum::Json;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/embeddings
///
/// Names of the embeddings the backend has loaded, sorted. Backend
/// failures surface as 502.
pub async fn list_embeddings(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let names = state.backend.embeddings().await?;
    Ok(Json(DataResponse { data: names }))
}
