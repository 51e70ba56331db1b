use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    /// Reported to submitters while a worker owns the job. Never persisted.
    Processing,
    Complete,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Complete => "COMPLETE",
            JobStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed)
    }

    /// Only non-terminal to terminal moves are legal.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        !self.is_terminal() && next.is_terminal()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(JobStatus::Pending),
            "PROCESSING" => Ok(JobStatus::Processing),
            "COMPLETE" => Ok(JobStatus::Complete),
            "FAILED" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status '{}'", other)),
        }
    }
}

/// The single write that ends a job. Carrying the url or the message inside
/// the variant keeps the two fields mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalOutcome {
    Complete { final_video_url: String },
    Failed { error_message: String },
}

impl TerminalOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        TerminalOutcome::Failed {
            error_message: message.into(),
        }
    }

    pub fn status(&self) -> JobStatus {
        match self {
            TerminalOutcome::Complete { .. } => JobStatus::Complete,
            TerminalOutcome::Failed { .. } => JobStatus::Failed,
        }
    }

    pub fn final_video_url(&self) -> Option<&str> {
        match self {
            TerminalOutcome::Complete { final_video_url } => Some(final_video_url),
            TerminalOutcome::Failed { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            TerminalOutcome::Complete { .. } => None,
            TerminalOutcome::Failed { error_message } => Some(error_message),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdJob {
    pub job_id: Uuid,
    pub status: JobStatus,
    #[schema(value_type = Object)]
    pub request_body: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
    #[serde(
        with = "time::serde::rfc3339::option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AdJob {
    pub fn pending(job_id: Uuid, request_body: serde_json::Value) -> Self {
        Self {
            job_id,
            status: JobStatus::Pending,
            request_body,
            created_at: OffsetDateTime::now_utc(),
            updated_at: None,
            final_video_url: None,
            error_message: None,
        }
    }

    pub fn apply_terminal(&mut self, outcome: &TerminalOutcome, at: OffsetDateTime) {
        self.status = outcome.status();
        self.final_video_url = outcome.final_video_url().map(str::to_string);
        self.error_message = outcome.error_message().map(str::to_string);
        self.updated_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn only_pending_moves_to_terminal() {
        assert!(JobStatus::Pending.can_transition_to(JobStatus::Complete));
        assert!(JobStatus::Pending.can_transition_to(JobStatus::Failed));
        assert!(!JobStatus::Pending.can_transition_to(JobStatus::Processing));
        assert!(!JobStatus::Complete.can_transition_to(JobStatus::Failed));
        assert!(!JobStatus::Failed.can_transition_to(JobStatus::Complete));
    }

    #[test]
    fn status_round_trips_through_its_column_text() {
        for status in [JobStatus::Pending, JobStatus::Complete, JobStatus::Failed] {
            assert_eq!(status.as_str().parse::<JobStatus>(), Ok(status));
        }
        assert!("DONE".parse::<JobStatus>().is_err());
    }

    #[test]
    fn terminal_outcome_populates_exactly_its_own_field() {
        let mut job = AdJob::pending(Uuid::new_v4(), json!({"sku": "TV-100"}));
        let now = OffsetDateTime::now_utc();

        job.apply_terminal(
            &TerminalOutcome::Complete {
                final_video_url: "https://cdn/ad.mp4".into(),
            },
            now,
        );
        assert_eq!(job.status, JobStatus::Complete);
        assert_eq!(job.final_video_url.as_deref(), Some("https://cdn/ad.mp4"));
        assert!(job.error_message.is_none());
        assert_eq!(job.updated_at, Some(now));

        let mut job = AdJob::pending(Uuid::new_v4(), json!({}));
        job.apply_terminal(&TerminalOutcome::failed("Video rendering timed out."), now);
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.final_video_url.is_none());
        assert_eq!(job.error_message.as_deref(), Some("Video rendering timed out."));
    }

    #[test]
    fn pending_job_serializes_camel_case_without_terminal_fields() {
        let job = AdJob::pending(Uuid::nil(), json!({"sku": "TV-100"}));
        let value = serde_json::to_value(&job).unwrap();

        assert_eq!(value["status"], "PENDING");
        assert_eq!(value["requestBody"]["sku"], "TV-100");
        assert!(value.get("jobId").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_none());
        assert!(value.get("finalVideoUrl").is_none());
        assert!(value.get("errorMessage").is_none());
    }
}
