use super::error::PipelineError;
use super::providers::{RenderHandle, RenderProvider, RenderStatus};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Fixed-interval polling budget for a submitted render. No backoff: the
/// longest wait is `interval * max_attempts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderPollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for RenderPollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 36,
        }
    }
}

impl RenderPollPolicy {
    pub fn ceiling(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

/// Blocks the invocation until the render is done, failed, or the budget is
/// spent. Each attempt sleeps first, then polls.
pub async fn wait_for_render(
    render: &dyn RenderProvider,
    handle: &RenderHandle,
    policy: RenderPollPolicy,
    job_id: Uuid,
) -> Result<String, PipelineError> {
    for attempt in 1..=policy.max_attempts {
        tokio::time::sleep(policy.interval).await;

        match render.poll_render(handle).await? {
            RenderStatus::Done { url } => {
                info!(%job_id, render_id = %handle, attempt, "Render finished");
                return Ok(url);
            }
            RenderStatus::Failed { detail } => {
                warn!(%job_id, render_id = %handle, attempt, detail = ?detail, "Render failed");
                return Err(PipelineError::RenderFailed { detail });
            }
            RenderStatus::Pending => {
                debug!(%job_id, render_id = %handle, attempt, max_attempts = policy.max_attempts, "Render still pending");
            }
        }
    }

    warn!(%job_id, render_id = %handle, ceiling = ?policy.ceiling(), "Render poll budget exhausted");
    Err(PipelineError::RenderTimedOut)
}
