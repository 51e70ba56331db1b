//! In-memory collaborators for exercising the pipeline without network I/O.

use super::blueprint::Blueprint;
use super::catalog::Product;
use super::providers::*;
use super::timeline::RenderRequest;
use anyhow::anyhow;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Barrier;

pub const TEST_BUCKET: &str = "test-bucket";

#[derive(Default)]
pub struct FakeBlobStore {
    objects: Mutex<HashMap<String, Bytes>>,
    fail_puts: bool,
}

impl FakeBlobStore {
    pub fn failing_puts() -> Self {
        Self {
            fail_puts: true,
            ..Self::default()
        }
    }

    pub fn insert(&self, key: &str, body: &str) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), Bytes::from(body.to_string()));
    }

    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    fn locate(&self, key: &str) -> BlobRef {
        BlobRef::new(TEST_BUCKET, key)
    }

    async fn store(&self, key: &str, body: Bytes, _content_type: &str) -> anyhow::Result<BlobRef> {
        if self.fail_puts {
            return Err(anyhow!("bucket unavailable"));
        }
        self.objects.lock().unwrap().insert(key.to_string(), body);
        Ok(self.locate(key))
    }

    async fn fetch(&self, blob: &BlobRef) -> anyhow::Result<Bytes> {
        self.objects
            .lock()
            .unwrap()
            .get(&blob.key)
            .cloned()
            .ok_or_else(|| anyhow!("no such object {}", blob))
    }

    async fn presign(&self, blob: &BlobRef, ttl: Duration) -> anyhow::Result<String> {
        Ok(format!("https://signed.test/{}/{}?ttl={}", blob.bucket, blob.key, ttl.as_secs()))
    }
}

pub fn test_blueprint() -> Blueprint {
    Blueprint {
        acts: [
            "a view of a bright classroom".into(),
            "a scene showing friends laughing".into(),
            "a calm evening at home".into(),
        ],
        voiceover_script: "Back to school, back to brilliant.".into(),
        voice_id: "2zRM7PkgwBPiau2jvVXc".into(),
    }
}

pub struct FakeBlueprint {
    pub fail: bool,
}

#[async_trait]
impl BlueprintProvider for FakeBlueprint {
    async fn generate_blueprint(&self, _product: &Product, _user_context: &str) -> Result<Blueprint, ProviderError> {
        if self.fail {
            return Err(ProviderError::malformed("blueprint", "missing choices"));
        }
        Ok(test_blueprint())
    }
}

/// Clip generator that fails or panics for selected prompts and records
/// every prompt it finished.
#[derive(Default)]
pub struct FakeClips {
    pub failing_prompts: HashSet<String>,
    pub panicking_prompts: HashSet<String>,
    pub delay: Duration,
    /// Every call waits here before answering.
    pub barrier: Option<Arc<Barrier>>,
    pub(crate) completed: Mutex<Vec<String>>,
}

impl FakeClips {
    pub fn failing(prompt: &str) -> Self {
        Self {
            failing_prompts: HashSet::from([prompt.to_string()]),
            ..Self::default()
        }
    }

    pub fn panicking(prompt: &str) -> Self {
        Self {
            panicking_prompts: HashSet::from([prompt.to_string()]),
            ..Self::default()
        }
    }

    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClipProvider for FakeClips {
    async fn generate_clip(&self, prompt: &str) -> Result<Bytes, ProviderError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if self.panicking_prompts.contains(prompt) {
            panic!("clip provider exploded");
        }
        self.completed.lock().unwrap().push(prompt.to_string());
        if self.failing_prompts.contains(prompt) {
            return Err(ProviderError::Api {
                provider: "clips",
                status: 503,
                body: "model overloaded".into(),
            });
        }
        Ok(Bytes::from(format!("video:{}", prompt)))
    }
}

#[derive(Default)]
pub struct FakeVoice {
    pub fail: bool,
    pub panic: bool,
    pub barrier: Option<Arc<Barrier>>,
}

#[async_trait]
impl VoiceoverProvider for FakeVoice {
    async fn synthesize_voice(&self, script: &str, voice_id: &str) -> Result<Bytes, ProviderError> {
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if self.panic {
            panic!("voiceover provider exploded");
        }
        if self.fail {
            return Err(ProviderError::Api {
                provider: "voiceover",
                status: 401,
                body: "invalid api key".into(),
            });
        }
        Ok(Bytes::from(format!("audio:{}:{}", voice_id, script)))
    }
}

/// Render service that replays scripted statuses, then reports `Pending`
/// forever.
#[derive(Default)]
pub struct FakeRender {
    statuses: Mutex<VecDeque<RenderStatus>>,
    fail_submit: bool,
    fail_poll: bool,
    polls: AtomicUsize,
    submitted: Mutex<Vec<RenderRequest>>,
}

impl FakeRender {
    pub fn with_statuses(statuses: Vec<RenderStatus>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            ..Self::default()
        }
    }

    pub fn done(url: &str) -> Self {
        Self::with_statuses(vec![RenderStatus::Pending, RenderStatus::Done { url: url.into() }])
    }

    pub fn failing_submit() -> Self {
        Self {
            fail_submit: true,
            ..Self::default()
        }
    }

    pub fn failing_poll() -> Self {
        Self {
            fail_poll: true,
            ..Self::default()
        }
    }

    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<RenderRequest> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl RenderProvider for FakeRender {
    async fn submit_render(&self, request: &RenderRequest) -> Result<RenderHandle, ProviderError> {
        if self.fail_submit {
            return Err(ProviderError::Api {
                provider: "render",
                status: 400,
                body: "bad timeline".into(),
            });
        }
        self.submitted.lock().unwrap().push(request.clone());
        Ok(RenderHandle("render-123".into()))
    }

    async fn poll_render(&self, _handle: &RenderHandle) -> Result<RenderStatus, ProviderError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        if self.fail_poll {
            return Err(ProviderError::malformed("render", "missing status"));
        }
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(RenderStatus::Pending))
    }
}
