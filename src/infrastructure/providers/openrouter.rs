use super::{parse_json, request_error};
use crate::modules::pipeline::blueprint::{creative_brief, Blueprint};
use crate::modules::pipeline::catalog::Product;
use crate::modules::pipeline::providers::{BlueprintProvider, ProviderError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

const PROVIDER: &str = "OpenRouter";
const CHAT_COMPLETIONS_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Blueprint generation through an OpenRouter chat model in JSON mode.
pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl OpenRouterClient {
    pub fn new(client: reqwest::Client, api_key: String, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }
}

/// Some models wrap JSON-mode output in a markdown fence anyway.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

fn extract_blueprint(completion: ChatCompletion) -> Result<Blueprint, ProviderError> {
    let content = completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ProviderError::malformed(PROVIDER, "completion has no message content"))?;

    Blueprint::from_json(strip_code_fence(&content)).map_err(|detail| ProviderError::malformed(PROVIDER, detail))
}

#[async_trait]
impl BlueprintProvider for OpenRouterClient {
    async fn generate_blueprint(&self, product: &Product, user_context: &str) -> Result<Blueprint, ProviderError> {
        info!(product = %product.product_name, model = %self.model, "Requesting ad blueprint");

        let payload = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": creative_brief(product, user_context) }],
            "response_format": { "type": "json_object" },
        });

        let response = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .header("X-Title", "Ad Forge")
            .json(&payload)
            .send()
            .await
            .map_err(request_error(PROVIDER))?;

        let completion: ChatCompletion = parse_json(PROVIDER, response).await?;
        extract_blueprint(completion)
    }
}
