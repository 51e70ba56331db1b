//! Contracts for the external services the worker drives.
//!
//! Each collaborator is a single synchronous-looking call. Implementations
//! live in `infrastructure::providers` and `infrastructure::storage`; tests
//! substitute in-memory fakes.

use super::blueprint::Blueprint;
use super::catalog::Product;
use super::timeline::RenderRequest;
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::time::Duration;

/// Failure reported by an upstream generation, render or storage service.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{provider} request failed: {source}")]
    Request {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} returned a malformed response: {detail}")]
    Malformed {
        provider: &'static str,
        detail: String,
    },
}

impl ProviderError {
    pub fn malformed(provider: &'static str, detail: impl Into<String>) -> Self {
        ProviderError::Malformed {
            provider,
            detail: detail.into(),
        }
    }

    /// Short form for the job record. Upstream bodies and transport detail
    /// stay in the logs.
    pub fn summary(&self) -> String {
        match self {
            ProviderError::Request { provider, .. } => format!("{} request failed.", provider),
            ProviderError::Api { provider, status, .. } => format!("{} request failed ({}).", provider, status),
            ProviderError::Malformed { provider, .. } => format!("{} returned an unusable response.", provider),
        }
    }
}

#[async_trait]
pub trait BlueprintProvider: Send + Sync {
    async fn generate_blueprint(&self, product: &Product, user_context: &str) -> Result<Blueprint, ProviderError>;
}

#[async_trait]
pub trait ClipProvider: Send + Sync {
    async fn generate_clip(&self, prompt: &str) -> Result<Bytes, ProviderError>;
}

#[async_trait]
pub trait VoiceoverProvider: Send + Sync {
    async fn synthesize_voice(&self, script: &str, voice_id: &str) -> Result<Bytes, ProviderError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderHandle(pub String);

impl fmt::Display for RenderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderStatus {
    Pending,
    Done { url: String },
    Failed { detail: Option<String> },
}

#[async_trait]
pub trait RenderProvider: Send + Sync {
    async fn submit_render(&self, request: &RenderRequest) -> Result<RenderHandle, ProviderError>;

    async fn poll_render(&self, handle: &RenderHandle) -> Result<RenderStatus, ProviderError>;
}

/// Location of an object in the blob store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRef {
    pub bucket: String,
    pub key: String,
}

impl BlobRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parses an `s3://bucket/key` URI.
    pub fn parse(uri: &str) -> Option<Self> {
        let parsed = url::Url::parse(uri).ok()?;
        if parsed.scheme() != "s3" {
            return None;
        }
        let bucket = parsed.host_str()?;
        let key = parsed.path().trim_start_matches('/');
        if bucket.is_empty() || key.is_empty() {
            return None;
        }
        Some(Self::new(bucket, key))
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Failures here are fatal to the invocation.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Reference to `key` in the store's default bucket.
    fn locate(&self, key: &str) -> BlobRef;

    async fn store(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<BlobRef>;

    async fn fetch(&self, blob: &BlobRef) -> anyhow::Result<Bytes>;

    async fn presign(&self, blob: &BlobRef, ttl: Duration) -> anyhow::Result<String>;
}
