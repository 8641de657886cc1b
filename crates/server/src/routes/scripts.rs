use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::Value;

use crate::{error::ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct RunScriptRequest {
    pub script: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Run a grading script. The response is the merged execution body:
/// `{success, logs, error, patched}` plus whatever fields the script's
/// structured payload contributed (e.g. `assignment_name`).
pub async fn run_script(
    State(state): State<AppState>,
    Json(request): Json<RunScriptRequest>,
) -> Result<Json<Value>, ApiError> {
    let body = state
        .execution
        .run_script(&request.script, &request.args)
        .await?;
    Ok(Json(body))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/scripts/run", post(run_script))
}
