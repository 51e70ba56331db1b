use std::env;
use std::str::FromStr;

pub enum EnvKey {
    ServerPort,
    JobStore,
    DatabaseUrl,
    JobQueue,
    RabbitMqUrl,
    WorkerEnabled,
    WorkerConcurrency,
    S3Endpoint,
    S3Bucket,
    S3Region,
    S3AccessKey,
    S3SecretKey,
    OpenRouterApiKey,
    BlueprintModel,
    HfToken,
    ClipApiUrl,
    ClipModel,
    ClipTimeoutSecs,
    ElevenLabsApiKey,
    VoiceModel,
    ShotstackApiKey,
    ShotstackApiUrl,
    RenderPollIntervalSecs,
    RenderPollMaxAttempts,
    AssetUrlTtlSecs,
    ProductCatalogKey,
    BrandingClipKey,
    MusicKey,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::JobStore => "JOB_STORE",
            EnvKey::DatabaseUrl => "DATABASE_URL",
            EnvKey::JobQueue => "JOB_QUEUE",
            EnvKey::RabbitMqUrl => "RABBITMQ_URL",
            EnvKey::WorkerEnabled => "WORKER_ENABLED",
            EnvKey::WorkerConcurrency => "WORKER_CONCURRENCY",
            EnvKey::S3Endpoint => "S3_ENDPOINT",
            EnvKey::S3Bucket => "S3_BUCKET",
            EnvKey::S3Region => "S3_REGION",
            EnvKey::S3AccessKey => "AWS_ACCESS_KEY_ID",
            EnvKey::S3SecretKey => "AWS_SECRET_ACCESS_KEY",
            EnvKey::OpenRouterApiKey => "OPENROUTER_API_KEY",
            EnvKey::BlueprintModel => "BLUEPRINT_MODEL",
            EnvKey::HfToken => "HF_TOKEN",
            EnvKey::ClipApiUrl => "CLIP_API_URL",
            EnvKey::ClipModel => "CLIP_MODEL",
            EnvKey::ClipTimeoutSecs => "CLIP_TIMEOUT_SECS",
            EnvKey::ElevenLabsApiKey => "ELEVENLABS_API_KEY",
            EnvKey::VoiceModel => "VOICE_MODEL",
            EnvKey::ShotstackApiKey => "SHOTSTACK_API_KEY",
            EnvKey::ShotstackApiUrl => "SHOTSTACK_API_URL",
            EnvKey::RenderPollIntervalSecs => "RENDER_POLL_INTERVAL_SECS",
            EnvKey::RenderPollMaxAttempts => "RENDER_POLL_MAX_ATTEMPTS",
            EnvKey::AssetUrlTtlSecs => "ASSET_URL_TTL_SECS",
            EnvKey::ProductCatalogKey => "PRODUCT_CATALOG_KEY",
            EnvKey::BrandingClipKey => "BRANDING_CLIP_KEY",
            EnvKey::MusicKey => "MUSIC_KEY",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

pub fn get_opt(key: EnvKey) -> Option<String> {
    env::var(key.as_str()).ok().filter(|v| !v.is_empty())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Ok(val) => val.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}
