//! Handlers for the default image dimensions.

use axum::extract::State;
use axum::Json;
use imagine_core::dimensions::{Dimensions, SUPPORTED_PRESETS};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Response for the dimension settings endpoints.
#[derive(Debug, Serialize)]
pub struct DimensionsResponse {
    pub width: u32,
    pub height: u32,
    /// Pairs accepted by PUT.
    pub presets: &'static [Dimensions],
}

impl From<Dimensions> for DimensionsResponse {
    fn from(current: Dimensions) -> Self {
        Self {
            width: current.width,
            height: current.height,
            presets: SUPPORTED_PRESETS,
        }
    }
}

/// Request body for PUT /settings/dimensions.
#[derive(Debug, Deserialize)]
pub struct UpdateDimensionsRequest {
    pub width: u32,
    pub height: u32,
}

/// GET /api/v1/settings/dimensions
pub async fn get_dimensions(State(state): State<AppState>) -> Json<DataResponse<DimensionsResponse>> {
    Json(DataResponse {
        data: state.defaults.get().into(),
    })
}

/// PUT /api/v1/settings/dimensions
///
/// Only supported presets are accepted; anything else is a 400.
pub async fn update_dimensions(
    State(state): State<AppState>,
    Json(body): Json<UpdateDimensionsRequest>,
) -> AppResult<Json<DataResponse<DimensionsResponse>>> {
    let updated = state.defaults.set(body.width, body.height)?;
    tracing::info!(width = updated.width, height = updated.height, "Default dimensions updated");

    Ok(Json(DataResponse {
        data: updated.into(),
    }))
}
