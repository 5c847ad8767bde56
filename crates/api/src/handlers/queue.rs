use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::response::DataResponse;
use crate::state::AppState;

/// Response for GET /queue.
#[derive(Debug, Serialize)]
pub struct QueueStatusResponse {
    /// Jobs waiting for the worker; the job being rendered is not counted.
    pub pending: usize,
}

/// GET /api/v1/queue
pub async fn get_queue_status(
    State(state): State<AppState>,
) -> Json<DataResponse<QueueStatusResponse>> {
    Json(DataResponse {
        data: QueueStatusResponse {
            pending: state.queue.pending_len(),
        },
    })
}
