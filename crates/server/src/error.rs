use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use services::services::{execution::ExecutionServiceError, patches::PatchError};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Execution(#[from] ExecutionServiceError),
    #[error(transparent)]
    Patch(#[from] PatchError),
    #[error("Failed to read upload: {0}")]
    Multipart(#[from] MultipartError),
    #[error("{0}")]
    BadRequest(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ApiError {
    /// Every internal failure becomes a 200 with `success: false` so the
    /// desktop client keeps a single handling path for all outcomes.
    fn into_response(self) -> Response {
        let response = ApiResponse::<()>::error(&self.to_string());
        (StatusCode::OK, Json(response)).into_response()
    }
}
