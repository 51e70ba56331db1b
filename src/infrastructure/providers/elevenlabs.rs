use super::{ensure_success, request_error};
use crate::modules::pipeline::providers::{ProviderError, VoiceoverProvider};
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;

const PROVIDER: &str = "ElevenLabs";
const TEXT_TO_SPEECH_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";

pub struct ElevenLabsClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl ElevenLabsClient {
    pub fn new(client: reqwest::Client, api_key: String, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl VoiceoverProvider for ElevenLabsClient {
    async fn synthesize_voice(&self, script: &str, voice_id: &str) -> Result<Bytes, ProviderError> {
        let payload = json!({
            "text": script,
            "model_id": self.model,
            "voice_settings": { "stability": 0.5, "similarity_boost": 0.5 },
        });

        let response = self
            .client
            .post(format!("{}/{}", TEXT_TO_SPEECH_URL, voice_id))
            .header("xi-api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&payload)
            .send()
            .await
            .map_err(request_error(PROVIDER))?;

        let response = ensure_success(PROVIDER, response).await?;
        response.bytes().await.map_err(request_error(PROVIDER))
    }
}
