use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const AD_JOBS_QUEUE: &str = "ad_generation_jobs";

/// Queue payload handed from the dispatcher to a worker. Carries only the
/// identifier; the worker re-reads everything else from the job store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdJobMessage {
    pub job_id: Uuid,
}
