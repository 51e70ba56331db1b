use crate::config::env::{self, EnvKey};
use crate::modules::pipeline::render::RenderPollPolicy;
use anyhow::{anyhow, Result};
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobStoreBackend {
    Postgres,
    Memory,
}

impl FromStr for JobStoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" => Ok(JobStoreBackend::Postgres),
            "memory" => Ok(JobStoreBackend::Memory),
            other => Err(anyhow!("Unknown JOB_STORE backend '{}'", other)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobQueueBackend {
    RabbitMq,
    Channel,
}

impl FromStr for JobQueueBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rabbitmq" | "amqp" => Ok(JobQueueBackend::RabbitMq),
            "channel" | "memory" => Ok(JobQueueBackend::Channel),
            other => Err(anyhow!("Unknown JOB_QUEUE backend '{}'", other)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_port: u16,
    pub job_store: JobStoreBackend,
    pub database_url: Option<String>,
    pub job_queue: JobQueueBackend,
    pub rabbitmq_url: Option<String>,
    pub worker_enabled: bool,
    pub worker_concurrency: u16,
    pub s3_endpoint: String,
    pub s3_bucket: String,
    pub s3_region: String,
    pub s3_access_key: String,
    pub s3_secret_key: String,
    pub openrouter_api_key: String,
    pub blueprint_model: String,
    pub hf_token: String,
    pub clip_api_url: String,
    pub clip_model: String,
    pub clip_timeout_secs: u64,
    pub elevenlabs_api_key: String,
    pub voice_model: String,
    pub shotstack_api_key: String,
    pub shotstack_api_url: String,
    pub render_poll_interval_secs: u64,
    pub render_poll_max_attempts: u32,
    pub asset_url_ttl_secs: u64,
    pub product_catalog_key: String,
    pub branding_clip_key: String,
    pub music_key: String,
}

/// An in-process queue is only drained by the worker in the same process,
/// so it cannot run with the worker disabled.
fn check_worker_topology(job_queue: JobQueueBackend, worker_enabled: bool) -> Result<()> {
    if job_queue == JobQueueBackend::Channel && !worker_enabled {
        return Err(anyhow!(
            "JOB_QUEUE=channel requires WORKER_ENABLED=true; nothing else consumes the in-process queue"
        ));
    }
    Ok(())
}

fn required(key: EnvKey) -> Result<String> {
    let name = key.as_str();
    env::get(key).map_err(|_| anyhow!("Missing required environment variable {}", name))
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        let job_store: JobStoreBackend = env::get_or(EnvKey::JobStore, "postgres").parse()?;
        let job_queue: JobQueueBackend = env::get_or(EnvKey::JobQueue, "rabbitmq").parse()?;

        let database_url = env::get_opt(EnvKey::DatabaseUrl);
        if job_store == JobStoreBackend::Postgres && database_url.is_none() {
            return Err(anyhow!("DATABASE_URL is required when JOB_STORE=postgres"));
        }

        let rabbitmq_url = env::get_opt(EnvKey::RabbitMqUrl);
        if job_queue == JobQueueBackend::RabbitMq && rabbitmq_url.is_none() {
            return Err(anyhow!("RABBITMQ_URL is required when JOB_QUEUE=rabbitmq"));
        }

        let worker_enabled = env::get_parsed(EnvKey::WorkerEnabled, true);
        check_worker_topology(job_queue, worker_enabled)?;

        Ok(Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 3000),
            job_store,
            database_url,
            job_queue,
            rabbitmq_url,
            worker_enabled,
            worker_concurrency: env::get_parsed(EnvKey::WorkerConcurrency, 4).max(1),
            s3_endpoint: required(EnvKey::S3Endpoint)?,
            s3_bucket: required(EnvKey::S3Bucket)?,
            s3_region: env::get_or(EnvKey::S3Region, "us-east-1"),
            s3_access_key: required(EnvKey::S3AccessKey)?,
            s3_secret_key: required(EnvKey::S3SecretKey)?,
            openrouter_api_key: required(EnvKey::OpenRouterApiKey)?,
            blueprint_model: env::get_or(EnvKey::BlueprintModel, "google/gemini-flash-1.5"),
            hf_token: required(EnvKey::HfToken)?,
            clip_api_url: env::get_or(EnvKey::ClipApiUrl, "https://api-inference.huggingface.co"),
            clip_model: env::get_or(EnvKey::ClipModel, "Wan-AI/Wan2.2-T2V-A14B"),
            clip_timeout_secs: env::get_parsed(EnvKey::ClipTimeoutSecs, 120),
            elevenlabs_api_key: required(EnvKey::ElevenLabsApiKey)?,
            voice_model: env::get_or(EnvKey::VoiceModel, "eleven_multilingual_v2"),
            shotstack_api_key: required(EnvKey::ShotstackApiKey)?,
            shotstack_api_url: env::get_or(EnvKey::ShotstackApiUrl, "https://api.shotstack.io/v1"),
            render_poll_interval_secs: env::get_parsed(EnvKey::RenderPollIntervalSecs, 5),
            render_poll_max_attempts: env::get_parsed(EnvKey::RenderPollMaxAttempts, 36),
            asset_url_ttl_secs: env::get_parsed(EnvKey::AssetUrlTtlSecs, 600),
            product_catalog_key: env::get_or(EnvKey::ProductCatalogKey, "product_db.json"),
            branding_clip_key: env::get_or(EnvKey::BrandingClipKey, "curated_clips/brand_outro.mp4"),
            music_key: env::get_or(EnvKey::MusicKey, "music/background_music.mp3"),
        })
    }

    pub fn render_poll_policy(&self) -> RenderPollPolicy {
        RenderPollPolicy {
            interval: Duration::from_secs(self.render_poll_interval_secs),
            max_attempts: self.render_poll_max_attempts,
        }
    }

    pub fn asset_url_ttl(&self) -> Duration {
        Duration::from_secs(self.asset_url_ttl_secs)
    }
}
