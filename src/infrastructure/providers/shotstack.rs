use super::{parse_json, request_error};
use crate::modules::pipeline::providers::{ProviderError, RenderHandle, RenderProvider, RenderStatus};
use crate::modules::pipeline::timeline::RenderRequest;
use async_trait::async_trait;
use serde::Deserialize;

const PROVIDER: &str = "Shotstack";

pub struct ShotstackClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: T,
}

#[derive(Debug, Deserialize)]
struct Queued {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RenderState {
    status: String,
    url: Option<String>,
    error: Option<String>,
}

impl ShotstackClient {
    pub fn new(client: reqwest::Client, api_url: String, api_key: String) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

/// Shotstack reports queued/fetching/rendering/saving while work is in
/// flight; only `done` and `failed` are final.
fn interpret(state: RenderState) -> Result<RenderStatus, ProviderError> {
    match state.status.as_str() {
        "done" => state
            .url
            .map(|url| RenderStatus::Done { url })
            .ok_or_else(|| ProviderError::malformed(PROVIDER, "render is done but has no url")),
        "failed" => Ok(RenderStatus::Failed {
            detail: state.error.filter(|e| !e.trim().is_empty()),
        }),
        _ => Ok(RenderStatus::Pending),
    }
}

#[async_trait]
impl RenderProvider for ShotstackClient {
    async fn submit_render(&self, request: &RenderRequest) -> Result<RenderHandle, ProviderError> {
        let response = self
            .client
            .post(format!("{}/render", self.api_url))
            .header("x-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(request_error(PROVIDER))?;

        let queued: Envelope<Queued> = parse_json(PROVIDER, response).await?;
        Ok(RenderHandle(queued.response.id))
    }

    async fn poll_render(&self, handle: &RenderHandle) -> Result<RenderStatus, ProviderError> {
        let response = self
            .client
            .get(format!("{}/render/{}", self.api_url, handle))
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(request_error(PROVIDER))?;

        let state: Envelope<RenderState> = parse_json(PROVIDER, response).await?;
        interpret(state.response)
    }
}
