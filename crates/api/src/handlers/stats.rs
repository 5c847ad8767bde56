use axum::extract::{Path, State};
use axum::Json;
use imagine_core::statistics::MemberStats;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/stats/{member_id}
///
/// 404 when the member has no completed jobs.
pub async fn get_member_stats(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
) -> AppResult<Json<DataResponse<MemberStats>>> {
    let stats = state
        .statistics
        .stats_by_member(&member_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Statistics for member {member_id}")))?;

    Ok(Json(DataResponse { data: stats }))
}
