use super::model::{AdJob, JobStatus, TerminalOutcome};
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum JobStoreError {
    #[error("Job {0} already exists")]
    Duplicate(Uuid),

    #[error("Job {0} not found")]
    NotFound(Uuid),

    #[error("Job {0} is already terminal")]
    AlreadyTerminal(Uuid),

    #[error("Corrupt job record {0}: {1}")]
    Corrupt(Uuid, String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Durable record of job state, keyed by job id.
///
/// Each job has one writer lineage: the dispatcher creates it, one worker
/// invocation finishes it. `set_terminal` refuses to touch a record that is
/// already COMPLETE or FAILED.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create(&self, job_id: Uuid, request_body: serde_json::Value) -> Result<AdJob, JobStoreError>;

    async fn get(&self, job_id: Uuid) -> Result<Option<AdJob>, JobStoreError>;

    async fn set_terminal(&self, job_id: Uuid, outcome: &TerminalOutcome) -> Result<(), JobStoreError>;
}

#[derive(Debug, FromRow)]
struct JobRow {
    job_id: Uuid,
    status: String,
    request_body: Json<serde_json::Value>,
    created_at: OffsetDateTime,
    updated_at: Option<OffsetDateTime>,
    final_video_url: Option<String>,
    error_message: Option<String>,
}

impl TryFrom<JobRow> for AdJob {
    type Error = JobStoreError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<JobStatus>()
            .map_err(|e| JobStoreError::Corrupt(row.job_id, e))?;

        Ok(AdJob {
            job_id: row.job_id,
            status,
            request_body: row.request_body.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
            final_video_url: row.final_video_url,
            error_message: row.error_message,
        })
    }
}

#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn create(&self, job_id: Uuid, request_body: serde_json::Value) -> Result<AdJob, JobStoreError> {
        let job = AdJob::pending(job_id, request_body);

        let result = sqlx::query(
            r#"
            INSERT INTO ad_jobs (job_id, status, request_body, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (job_id) DO NOTHING
            "#,
        )
        .bind(job.job_id)
        .bind(job.status.as_str())
        .bind(Json(&job.request_body))
        .bind(job.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(JobStoreError::Duplicate(job_id));
        }

        Ok(job)
    }

    async fn get(&self, job_id: Uuid) -> Result<Option<AdJob>, JobStoreError> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT job_id, status, request_body, created_at, updated_at, final_video_url, error_message
            FROM ad_jobs
            WHERE job_id = $1
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AdJob::try_from).transpose()
    }

    async fn set_terminal(&self, job_id: Uuid, outcome: &TerminalOutcome) -> Result<(), JobStoreError> {
        let result = sqlx::query(
            r#"
            UPDATE ad_jobs
            SET status = $2, final_video_url = $3, error_message = $4, updated_at = $5
            WHERE job_id = $1 AND status = 'PENDING'
            "#,
        )
        .bind(job_id)
        .bind(outcome.status().as_str())
        .bind(outcome.final_video_url())
        .bind(outcome.error_message())
        .bind(OffsetDateTime::now_utc())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        // Nothing updated: either the id is unknown or the job already finished.
        match self.get(job_id).await? {
            Some(_) => Err(JobStoreError::AlreadyTerminal(job_id)),
            None => Err(JobStoreError::NotFound(job_id)),
        }
    }
}

/// Process-local store with the same semantics as the Postgres one.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<Uuid, AdJob>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn jobs_with_status(&self, status: JobStatus) -> Vec<AdJob> {
        self.jobs
            .read()
            .await
            .values()
            .filter(|job| job.status == status)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, job_id: Uuid, request_body: serde_json::Value) -> Result<AdJob, JobStoreError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job_id) {
            return Err(JobStoreError::Duplicate(job_id));
        }

        let job = AdJob::pending(job_id, request_body);
        jobs.insert(job_id, job.clone());
        Ok(job)
    }

    async fn get(&self, job_id: Uuid) -> Result<Option<AdJob>, JobStoreError> {
        Ok(self.jobs.read().await.get(&job_id).cloned())
    }

    async fn set_terminal(&self, job_id: Uuid, outcome: &TerminalOutcome) -> Result<(), JobStoreError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&job_id).ok_or(JobStoreError::NotFound(job_id))?;

        if !job.status.can_transition_to(outcome.status()) {
            return Err(JobStoreError::AlreadyTerminal(job_id));
        }

        job.apply_terminal(outcome, OffsetDateTime::now_utc());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[tokio::test]
    async fn create_then_get_returns_pending_record() {
        let store = MemoryJobStore::new();
        let id = Uuid::new_v4();
        store.create(id, json!({"sku": "TV-100"})).await.unwrap();

        let job = store.get(id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.request_body, json!({"sku": "TV-100"}));
        assert!(job.updated_at.is_none());
    }

    #[tokio::test]
    async fn job_id_is_created_at_most_once() {
        let store = MemoryJobStore::new();
        let id = Uuid::new_v4();
        store.create(id, json!({"sku": "A"})).await.unwrap();

        let err = store.create(id, json!({"sku": "B"})).await.unwrap_err();
        assert_matches!(err, JobStoreError::Duplicate(dup) if dup == id);
        assert_eq!(store.get(id).await.unwrap().unwrap().request_body, json!({"sku": "A"}));
    }

    #[tokio::test]
    async fn terminal_record_never_changes_again() {
        let store = MemoryJobStore::new();
        let id = Uuid::new_v4();
        store.create(id, json!({})).await.unwrap();

        store
            .set_terminal(id, &TerminalOutcome::failed("One or more video clips failed to generate."))
            .await
            .unwrap();

        let err = store
            .set_terminal(
                id,
                &TerminalOutcome::Complete {
                    final_video_url: "https://cdn/late.mp4".into(),
                },
            )
            .await
            .unwrap_err();
        assert_matches!(err, JobStoreError::AlreadyTerminal(_));

        let job = store.get(id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.final_video_url.is_none());
    }

    #[tokio::test]
    async fn terminal_write_for_unknown_job_is_not_found() {
        let store = MemoryJobStore::new();
        let err = store
            .set_terminal(Uuid::new_v4(), &TerminalOutcome::failed("boom"))
            .await
            .unwrap_err();
        assert_matches!(err, JobStoreError::NotFound(_));
    }

    #[test]
    fn row_with_unknown_status_is_rejected() {
        let row = JobRow {
            job_id: Uuid::nil(),
            status: "RUNNING".into(),
            request_body: Json(json!({})),
            created_at: OffsetDateTime::now_utc(),
            updated_at: None,
            final_video_url: None,
            error_message: None,
        };
        assert_matches!(AdJob::try_from(row), Err(JobStoreError::Corrupt(_, _)));
    }

    /// Postgres store against a live database. Skipped unless
    /// `DATABASE_URL` is set; the schema is migrated on connect.
    async fn pg_store() -> Option<PgJobStore> {
        let url = crate::config::env::get_opt(crate::config::env::EnvKey::DatabaseUrl)?;
        let pool = crate::infrastructure::db::pool::connect_job_store(&url, 1)
            .await
            .unwrap();
        Some(PgJobStore::new(pool))
    }

    #[tokio::test]
    async fn postgres_store_round_trips_a_job_through_its_terminal_write() {
        let Some(store) = pg_store().await else {
            eprintln!("DATABASE_URL not set; skipping Postgres job store test");
            return;
        };
        let id = Uuid::new_v4();
        let body = json!({"sku": "TV-100", "user_context": "summer sale"});

        let created = store.create(id, body.clone()).await.unwrap();
        assert_eq!(created.status, JobStatus::Pending);

        let err = store.create(id, json!({"sku": "other"})).await.unwrap_err();
        assert_matches!(err, JobStoreError::Duplicate(dup) if dup == id);

        let pending = store.get(id).await.unwrap().unwrap();
        assert_eq!(pending.status, JobStatus::Pending);
        assert_eq!(pending.request_body, body);
        assert!(pending.updated_at.is_none());

        store
            .set_terminal(
                id,
                &TerminalOutcome::Complete {
                    final_video_url: "https://cdn.test/final.mp4".into(),
                },
            )
            .await
            .unwrap();

        let err = store
            .set_terminal(id, &TerminalOutcome::failed("late failure"))
            .await
            .unwrap_err();
        assert_matches!(err, JobStoreError::AlreadyTerminal(_));

        let done = store.get(id).await.unwrap().unwrap();
        assert_eq!(done.status, JobStatus::Complete);
        assert_eq!(done.final_video_url.as_deref(), Some("https://cdn.test/final.mp4"));
        assert!(done.error_message.is_none());
        assert!(done.updated_at.is_some());
    }

    #[tokio::test]
    async fn postgres_store_reports_unknown_jobs() {
        let Some(store) = pg_store().await else {
            eprintln!("DATABASE_URL not set; skipping Postgres job store test");
            return;
        };
        let id = Uuid::new_v4();

        assert!(store.get(id).await.unwrap().is_none());
        let err = store
            .set_terminal(id, &TerminalOutcome::failed("boom"))
            .await
            .unwrap_err();
        assert_matches!(err, JobStoreError::NotFound(missing) if missing == id);
    }
}
