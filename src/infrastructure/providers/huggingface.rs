use super::{ensure_success, request_error};
use crate::modules::pipeline::providers::{ClipProvider, ProviderError};
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;

const PROVIDER: &str = "Hugging Face";

/// Text-to-video generation through the Hugging Face inference API. The
/// per-request timeout is the only bound on a clip task.
pub struct HuggingFaceClipClient {
    client: reqwest::Client,
    api_url: String,
    model: String,
    token: String,
}

impl HuggingFaceClipClient {
    pub fn new(client: reqwest::Client, api_url: String, model: String, token: String) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            model,
            token,
        }
    }

    fn model_url(&self) -> String {
        format!("{}/models/{}", self.api_url, self.model)
    }
}

#[async_trait]
impl ClipProvider for HuggingFaceClipClient {
    async fn generate_clip(&self, prompt: &str) -> Result<Bytes, ProviderError> {
        let response = self
            .client
            .post(self.model_url())
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "video/mp4")
            .json(&json!({ "inputs": prompt }))
            .send()
            .await
            .map_err(request_error(PROVIDER))?;

        let response = ensure_success(PROVIDER, response).await?;
        let bytes = response.bytes().await.map_err(request_error(PROVIDER))?;
        if bytes.is_empty() {
            return Err(ProviderError::malformed(PROVIDER, "empty video payload"));
        }
        Ok(bytes)
    }
}
