//! The worker side of an ad job: one invocation takes a job id from the
//! queue and drives it to exactly one terminal write.

use super::blueprint::{Blueprint, ACT_COUNT};
use super::catalog::{Product, ProductCatalog};
use super::error::PipelineError;
use super::providers::*;
use super::render::{wait_for_render, RenderPollPolicy};
use super::timeline::{self, TimelineAssets, PRODUCT_SHOT_COUNT};
use crate::modules::jobs::dto::CreateAdRequest;
use crate::modules::jobs::model::{AdJob, TerminalOutcome};
use crate::modules::jobs::repository::JobStore;
use anyhow::anyhow;
use bytes::Bytes;
use futures_util::future::join_all;
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

pub const WORKER_CRASHED: &str = "Worker crashed unexpectedly.";

/// Progress of one invocation. Only used for logging; nothing but the
/// terminal outcome is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Loading,
    Loaded,
    BlueprintReady,
    AssetsReady,
    TimelineSubmitted,
    RenderPolling,
}

/// External collaborators, built once at startup and shared by reference
/// with every invocation and its clip tasks.
#[derive(Clone)]
pub struct Providers {
    pub blueprint: Arc<dyn BlueprintProvider>,
    pub clips: Arc<dyn ClipProvider>,
    pub voice: Arc<dyn VoiceoverProvider>,
    pub render: Arc<dyn RenderProvider>,
    pub blobs: Arc<dyn BlobStore>,
    pub catalog: Arc<dyn ProductCatalog>,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub render_poll: RenderPollPolicy,
    /// Validity of every presigned asset URL. The whole pipeline is assumed
    /// to finish inside this window.
    pub asset_url_ttl: Duration,
    pub branding_clip_key: String,
    pub music_key: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            render_poll: RenderPollPolicy::default(),
            asset_url_ttl: Duration::from_secs(600),
            branding_clip_key: "curated_clips/brand_outro.mp4".to_string(),
            music_key: "music/background_music.mp3".to_string(),
        }
    }
}

struct Invocation {
    job_id: Uuid,
    stage: Stage,
}

impl Invocation {
    fn advance(&mut self, stage: Stage) {
        self.stage = stage;
        info!(job_id = %self.job_id, stage = ?stage, "Pipeline stage reached");
    }
}

pub struct AdPipeline {
    jobs: Arc<dyn JobStore>,
    providers: Providers,
    settings: PipelineSettings,
}

impl AdPipeline {
    pub fn new(jobs: Arc<dyn JobStore>, providers: Providers, settings: PipelineSettings) -> Self {
        Self {
            jobs,
            providers,
            settings,
        }
    }

    /// Runs one invocation and performs its terminal write.
    ///
    /// Every error and panic inside the pipeline is turned into a FAILED
    /// write for `job_id`. Returns `None` without writing when the job had
    /// already reached a terminal state (a redelivered message).
    pub async fn run(&self, job_id: Uuid) -> Option<TerminalOutcome> {
        let mut invocation = Invocation {
            job_id,
            stage: Stage::Loading,
        };

        let result = AssertUnwindSafe(self.execute(&mut invocation))
            .catch_unwind()
            .await;

        let outcome = match result {
            Ok(Ok(Some(final_video_url))) => {
                info!(%job_id, url = %final_video_url, "✅ Ad job complete");
                TerminalOutcome::Complete { final_video_url }
            }
            Ok(Ok(None)) => return None,
            Ok(Err(e)) => {
                match std::error::Error::source(&e) {
                    Some(cause) => error!(%job_id, stage = ?invocation.stage, error = %e, cause = %cause, "❌ Ad job failed"),
                    None => error!(%job_id, stage = ?invocation.stage, error = %e, "❌ Ad job failed"),
                }
                TerminalOutcome::failed(e.to_string())
            }
            Err(_) => {
                error!(%job_id, stage = ?invocation.stage, "❌ Ad job worker panicked");
                TerminalOutcome::failed(WORKER_CRASHED)
            }
        };

        if let Err(e) = self.jobs.set_terminal(job_id, &outcome).await {
            error!(%job_id, status = %outcome.status(), error = %e, "Failed to write terminal job state");
        }

        Some(outcome)
    }

    async fn execute(&self, invocation: &mut Invocation) -> Result<Option<String>, PipelineError> {
        let job_id = invocation.job_id;

        let job = self.load(job_id).await?;
        if job.status.is_terminal() {
            warn!(%job_id, status = %job.status, "Job already finished, skipping redelivered message");
            return Ok(None);
        }
        invocation.advance(Stage::Loaded);

        let request: CreateAdRequest = serde_json::from_value(job.request_body)
            .map_err(|e| PipelineError::InvalidRequest(e.to_string()))?;
        let product = self.find_product(&request.sku).await?;

        let blueprint = self
            .providers
            .blueprint
            .generate_blueprint(&product, &request.user_context)
            .await?;
        invocation.advance(Stage::BlueprintReady);

        // Clip tasks start first so they overlap with the voiceover.
        let clip_tasks = self.spawn_clip_tasks(job_id, &blueprint);
        let voiceover_url = self.produce_voiceover(job_id, &blueprint).await?;
        let clips = Self::join_clips(job_id, clip_tasks).await?;

        let assets = self
            .materialize_assets(job_id, clips, &product, voiceover_url)
            .await?;
        invocation.advance(Stage::AssetsReady);

        let render_request = timeline::assemble(&assets);
        let handle = self.providers.render.submit_render(&render_request).await?;
        info!(%job_id, render_id = %handle, "Timeline submitted for rendering");
        invocation.advance(Stage::TimelineSubmitted);

        invocation.advance(Stage::RenderPolling);
        let url = wait_for_render(
            self.providers.render.as_ref(),
            &handle,
            self.settings.render_poll,
            job_id,
        )
        .await?;

        Ok(Some(url))
    }

    async fn load(&self, job_id: Uuid) -> Result<AdJob, PipelineError> {
        self.jobs
            .get(job_id)
            .await?
            .ok_or(PipelineError::JobNotFound(job_id))
    }

    async fn find_product(&self, sku: &str) -> Result<Product, PipelineError> {
        let product = self
            .providers
            .catalog
            .find(sku)
            .await
            .map_err(PipelineError::storage)?
            .ok_or_else(|| PipelineError::ProductNotFound(sku.to_string()))?;

        if product.product_shot_urls.len() < PRODUCT_SHOT_COUNT {
            return Err(PipelineError::MissingProductShots {
                sku: sku.to_string(),
                required: PRODUCT_SHOT_COUNT,
                found: product.product_shot_urls.len(),
            });
        }

        Ok(product)
    }

    /// One detached task per act. A failed generation becomes `None`; the
    /// tasks never cancel each other.
    fn spawn_clip_tasks(&self, job_id: Uuid, blueprint: &Blueprint) -> Vec<JoinHandle<Option<Bytes>>> {
        blueprint
            .acts
            .iter()
            .enumerate()
            .map(|(index, prompt)| {
                let clips = Arc::clone(&self.providers.clips);
                let prompt = prompt.clone();
                tokio::spawn(async move {
                    info!(%job_id, clip = index + 1, "Generating video clip");
                    match clips.generate_clip(&prompt).await {
                        Ok(bytes) => {
                            info!(%job_id, clip = index + 1, size = bytes.len(), "Video clip generated");
                            Some(bytes)
                        }
                        Err(e) => {
                            warn!(%job_id, clip = index + 1, prompt = %prompt, error = %e, "Video clip generation failed");
                            None
                        }
                    }
                })
            })
            .collect()
    }

    /// Waits for every clip task before deciding; any missing clip fails the
    /// whole job.
    async fn join_clips(
        job_id: Uuid,
        tasks: Vec<JoinHandle<Option<Bytes>>>,
    ) -> Result<[Bytes; ACT_COUNT], PipelineError> {
        let mut clips = Vec::with_capacity(ACT_COUNT);
        let mut failed = 0usize;

        for (index, joined) in join_all(tasks).await.into_iter().enumerate() {
            match joined {
                Ok(Some(bytes)) => clips.push(bytes),
                Ok(None) => failed += 1,
                Err(e) => {
                    error!(%job_id, clip = index + 1, error = %e, "Video clip task aborted");
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            warn!(%job_id, failed, "Not all clips were generated");
            return Err(PipelineError::ClipsFailed);
        }

        clips.try_into().map_err(|_| PipelineError::ClipsFailed)
    }

    async fn produce_voiceover(&self, job_id: Uuid, blueprint: &Blueprint) -> Result<String, PipelineError> {
        info!(%job_id, voice_id = %blueprint.voice_id, "Synthesizing voiceover");
        let audio = self
            .providers
            .voice
            .synthesize_voice(&blueprint.voiceover_script, &blueprint.voice_id)
            .await?;

        let key = format!("audio/{}.mp3", job_id);
        self.store_and_sign(&key, audio, "audio/mpeg").await
    }

    async fn materialize_assets(
        &self,
        job_id: Uuid,
        clips: [Bytes; ACT_COUNT],
        product: &Product,
        voiceover: String,
    ) -> Result<TimelineAssets, PipelineError> {
        let mut clip_urls = Vec::with_capacity(ACT_COUNT);
        for (index, bytes) in clips.into_iter().enumerate() {
            let key = format!("generated_clips/{}/act-{}.mp4", job_id, index + 1);
            clip_urls.push(self.store_and_sign(&key, bytes, "video/mp4").await?);
        }

        let mut shot_urls = Vec::with_capacity(PRODUCT_SHOT_COUNT);
        for uri in product.product_shot_urls.iter().take(PRODUCT_SHOT_COUNT) {
            let blob = BlobRef::parse(uri)
                .ok_or_else(|| PipelineError::storage(anyhow!("Invalid product shot location '{}'", uri)))?;
            shot_urls.push(self.sign(&blob).await?);
        }

        let blobs = &self.providers.blobs;
        let branding_clip = self.sign(&blobs.locate(&self.settings.branding_clip_key)).await?;
        let music = self.sign(&blobs.locate(&self.settings.music_key)).await?;

        Ok(TimelineAssets {
            clips: clip_urls
                .try_into()
                .map_err(|_| PipelineError::ClipsFailed)?,
            product_shots: shot_urls
                .try_into()
                .map_err(|_| PipelineError::storage(anyhow!("Missing product shots")))?,
            branding_clip,
            voiceover,
            music,
        })
    }

    async fn store_and_sign(&self, key: &str, body: Bytes, content_type: &str) -> Result<String, PipelineError> {
        let blob = self
            .providers
            .blobs
            .store(key, body, content_type)
            .await
            .map_err(PipelineError::storage)?;
        self.sign(&blob).await
    }

    async fn sign(&self, blob: &BlobRef) -> Result<String, PipelineError> {
        self.providers
            .blobs
            .presign(blob, self.settings.asset_url_ttl)
            .await
            .map_err(PipelineError::storage)
    }
}
