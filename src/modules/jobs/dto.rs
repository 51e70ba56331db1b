use super::model::JobStatus;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Creative request accepted by the submission endpoint.
///
/// The raw JSON is stored verbatim on the job; this type is only used to
/// validate it on the way in and to read it back in the worker.
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateAdRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "sku is required"))]
    pub sku: String,
    #[serde(default, alias = "context")]
    pub user_context: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAdResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
}
