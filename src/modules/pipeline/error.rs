use super::providers::ProviderError;
use crate::modules::jobs::repository::JobStoreError;
use uuid::Uuid;

/// Everything that can end a worker invocation early. The `Display` text is
/// what lands in the job's `errorMessage`.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Job {0} not found.")]
    JobNotFound(Uuid),

    #[error("Invalid request body: {0}")]
    InvalidRequest(String),

    #[error("Product SKU '{0}' not found.")]
    ProductNotFound(String),

    #[error("Product SKU '{sku}' needs {required} product shots, found {found}.")]
    MissingProductShots {
        sku: String,
        required: usize,
        found: usize,
    },

    #[error("{}", .0.summary())]
    Provider(#[from] ProviderError),

    #[error("One or more video clips failed to generate.")]
    ClipsFailed,

    #[error("Video rendering failed{}", .detail.as_deref().map(|d| format!(": {}", d)).unwrap_or_else(|| ".".to_string()))]
    RenderFailed { detail: Option<String> },

    #[error("Video rendering timed out.")]
    RenderTimedOut,

    #[error("Storage error: {0:#}")]
    Storage(#[source] anyhow::Error),

    #[error("Job store error: {0}")]
    Store(#[from] JobStoreError),
}

impl PipelineError {
    pub fn storage(err: anyhow::Error) -> Self {
        PipelineError::Storage(err)
    }
}
