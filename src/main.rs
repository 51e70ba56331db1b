use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod common;
mod config;
mod docs;
mod infrastructure;
mod modules;
mod routes;
mod state;
mod workers;

use config::settings::{AppConfig, JobQueueBackend, JobStoreBackend};
use infrastructure::providers::elevenlabs::ElevenLabsClient;
use infrastructure::providers::huggingface::HuggingFaceClipClient;
use infrastructure::providers::openrouter::OpenRouterClient;
use infrastructure::providers::shotstack::ShotstackClient;
use infrastructure::queue::JobQueue;
use infrastructure::queue::channel::ChannelQueue;
use infrastructure::queue::rabbitmq::RabbitMqService;
use infrastructure::storage::s3::StorageService;
use modules::jobs::events::AD_JOBS_QUEUE;
use modules::jobs::repository::{JobStore, MemoryJobStore, PgJobStore};
use modules::pipeline::catalog::BlobProductCatalog;
use modules::pipeline::orchestrator::{AdPipeline, PipelineSettings, Providers};

/// Pending messages the in-process queue holds; further submissions are
/// rejected until the workers catch up.
const CHANNEL_QUEUE_CAPACITY: usize = 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ad_forge=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting server...");

    let config = AppConfig::new()?;

    let jobs: Arc<dyn JobStore> = match config.job_store {
        JobStoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is not set"))?;
            let pool = infrastructure::db::pool::connect_job_store(url, config.worker_concurrency).await?;
            Arc::new(PgJobStore::new(pool))
        }
        JobStoreBackend::Memory => {
            warn!("Using in-memory job store; job records are lost on restart");
            Arc::new(MemoryJobStore::new())
        }
    };

    let pipeline = Arc::new(AdPipeline::new(
        jobs.clone(),
        build_providers(&config)?,
        PipelineSettings {
            render_poll: config.render_poll_policy(),
            asset_url_ttl: config.asset_url_ttl(),
            branding_clip_key: config.branding_clip_key.clone(),
            music_key: config.music_key.clone(),
        },
    ));

    let queue: Arc<dyn JobQueue> = match config.job_queue {
        JobQueueBackend::RabbitMq => {
            let url = config
                .rabbitmq_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("RABBITMQ_URL is not set"))?;
            let rabbit = RabbitMqService::new(url, AD_JOBS_QUEUE).await?;
            if config.worker_enabled {
                tokio::spawn(workers::ad_worker::start_ad_worker(
                    rabbit.clone(),
                    pipeline.clone(),
                    config.worker_concurrency,
                ));
            }
            Arc::new(rabbit)
        }
        JobQueueBackend::Channel => {
            let (queue, rx) = ChannelQueue::bounded(CHANNEL_QUEUE_CAPACITY);
            // Settings refuse a channel queue without an in-process worker.
            workers::ad_worker::start_channel_worker(rx, pipeline.clone(), config.worker_concurrency);
            Arc::new(queue)
        }
    };

    let state = state::AppState::new(jobs, queue);
    let app = app::create_app(state);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn build_providers(config: &AppConfig) -> anyhow::Result<Providers> {
    let http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()?;
    let clip_http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(config.clip_timeout_secs))
        .build()?;

    let storage = Arc::new(StorageService::new(
        &config.s3_endpoint,
        &config.s3_region,
        &config.s3_bucket,
        &config.s3_access_key,
        &config.s3_secret_key,
    ));

    Ok(Providers {
        blueprint: Arc::new(OpenRouterClient::new(
            http.clone(),
            config.openrouter_api_key.clone(),
            config.blueprint_model.clone(),
        )),
        clips: Arc::new(HuggingFaceClipClient::new(
            clip_http,
            config.clip_api_url.clone(),
            config.clip_model.clone(),
            config.hf_token.clone(),
        )),
        voice: Arc::new(ElevenLabsClient::new(
            http.clone(),
            config.elevenlabs_api_key.clone(),
            config.voice_model.clone(),
        )),
        render: Arc::new(ShotstackClient::new(
            http,
            config.shotstack_api_url.clone(),
            config.shotstack_api_key.clone(),
        )),
        catalog: Arc::new(BlobProductCatalog::new(storage.clone(), config.product_catalog_key.clone())),
        blobs: storage,
    })
}

/// Resolves on SIGINT or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
