use super::dto::{CreateAdRequest, SubmitAdResponse};
use super::events::AdJobMessage;
use super::model::{AdJob, JobStatus};
use crate::common::error::AppError;
use crate::state::AppState;
use anyhow::Context;
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

pub struct JobService;

impl JobService {
    /// Dispatcher: persist the PENDING record, then hand the id to the
    /// queue. Does not wait for the worker.
    ///
    /// If the record cannot be written nothing is enqueued. If the enqueue
    /// fails after the write, the record stays PENDING; there is no sweep
    /// that picks such jobs up again.
    pub async fn submit(state: AppState, body: serde_json::Value) -> Result<SubmitAdResponse, AppError> {
        let request: CreateAdRequest = serde_json::from_value(body.clone())
            .map_err(|e| AppError::Validation(format!("Invalid request body: {}", e)))?;
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let job_id = Uuid::new_v4();
        state
            .jobs
            .create(job_id, body)
            .await
            .with_context(|| format!("Failed to create job {}", job_id))?;
        info!(%job_id, sku = %request.sku, "Job saved with PENDING status");

        if let Err(e) = state.queue.enqueue(&AdJobMessage { job_id }).await {
            error!(%job_id, error = %e, "Job created but could not be dispatched; it will stay PENDING");
            return Err(AppError::Internal(e.context(format!("Failed to dispatch job {}", job_id))));
        }
        info!(%job_id, "Job dispatched to worker queue");

        Ok(SubmitAdResponse {
            job_id,
            status: JobStatus::Processing,
        })
    }

    /// Status reader: the stored record as-is.
    pub async fn get_status(state: AppState, job_id: Uuid) -> Result<AdJob, AppError> {
        state
            .jobs
            .get(job_id)
            .await
            .with_context(|| format!("Failed to load job {}", job_id))?
            .ok_or_else(|| AppError::NotFound("Job not found.".to_string()))
    }
}
