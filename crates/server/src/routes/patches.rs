use axum::{
    extract::{Multipart, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use services::services::patches::{ImportSummary, PatchStatus};
use utils::response::ApiResponse;

use crate::{error::ApiError, AppState};

/// Import a patch archive, replacing any previous overlay wholesale.
pub async fn import_patch(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ImportSummary>>, ApiError> {
    let mut archive: Option<Vec<u8>> = None;
    while let Some(field) = multipart.next_field().await? {
        archive = Some(field.bytes().await?.to_vec());
        break;
    }
    let archive = archive.ok_or_else(|| {
        ApiError::BadRequest("upload did not include a patch archive".to_string())
    })?;

    let summary = state.patches.import(&archive)?;
    Ok(Json(ApiResponse::success(summary)))
}

pub async fn patch_status(State(state): State<AppState>) -> Json<ApiResponse<PatchStatus>> {
    Json(ApiResponse::success(state.patches.status()))
}

/// Irreversible; confirmation is the caller's job.
pub async fn clear_patches(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let cleared = state.patches.clear()?;
    let message = if cleared {
        "patch overlay cleared"
    } else {
        "nothing to clear"
    };
    Ok(Json(ApiResponse::success_with_message(
        json!({ "cleared": cleared }),
        message,
    )))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/patches/import", post(import_patch))
        .route("/patches/status", get(patch_status))
        .route("/patches", delete(clear_patches))
}
