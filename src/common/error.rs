use crate::common::response::ApiError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

/// Errors surfaced directly to HTTP callers by the request path.
///
/// Worker-side failures never reach this type; they end up in the job
/// record's `errorMessage` instead.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Validation(msg) => ApiError(msg, StatusCode::BAD_REQUEST),
            AppError::NotFound(msg) => ApiError(msg, StatusCode::NOT_FOUND),
            AppError::Internal(e) => {
                error!("Internal error: {:#}", e);
                ApiError("Internal Server Error".to_string(), StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
