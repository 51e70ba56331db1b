use super::dto::{CreateAdRequest, SubmitAdResponse};
use super::model::AdJob;
use super::service::JobService;
use crate::common::error::AppError;
use crate::common::response::ApiResponse;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use uuid::Uuid;

/// Submit an ad generation job
///
/// Returns as soon as the job is recorded and queued; poll the status
/// endpoint for the result.
#[utoipa::path(
    post,
    path = "/api/v1/ads",
    request_body = CreateAdRequest,
    responses(
        (status = 202, description = "Job accepted", body = SubmitAdResponse),
        (status = 400, description = "Invalid request body", body = ApiResponse<String>),
        (status = 500, description = "Job could not be recorded or dispatched", body = ApiResponse<String>)
    ),
    tag = "Jobs"
)]
pub async fn submit_ad(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let response = JobService::submit(state, body).await?;
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// Get the current record of a job
#[utoipa::path(
    get,
    path = "/api/v1/status/{job_id}",
    params(
        ("job_id" = Uuid, Path, description = "Job ID returned by the submit endpoint")
    ),
    responses(
        (status = 200, description = "Job record", body = AdJob),
        (status = 400, description = "Malformed job id", body = ApiResponse<String>),
        (status = 404, description = "Job not found", body = ApiResponse<String>)
    ),
    tag = "Jobs"
)]
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<AdJob>, AppError> {
    let job_id = Uuid::parse_str(&job_id)
        .map_err(|_| AppError::Validation(format!("Invalid job id '{}'", job_id)))?;

    let job = JobService::get_status(state, job_id).await?;
    Ok(Json(job))
}
