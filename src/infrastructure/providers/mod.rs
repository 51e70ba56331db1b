//! HTTP clients for the generative-media services behind the pipeline
//! traits. Each client makes exactly one attempt per call.

use crate::modules::pipeline::providers::ProviderError;

pub mod elevenlabs;
pub mod huggingface;
pub mod openrouter;
pub mod shotstack;

/// Longest slice of an error body kept in a `ProviderError`.
const MAX_ERROR_BODY: usize = 500;

fn request_error(provider: &'static str) -> impl FnOnce(reqwest::Error) -> ProviderError {
    move |source| ProviderError::Request { provider, source }
}

/// Returns the response unchanged on a success status, or a
/// `ProviderError::Api` carrying the status and (truncated) body.
async fn ensure_success(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    Err(ProviderError::Api {
        provider,
        status: status.as_u16(),
        body: truncate(body),
    })
}

async fn parse_json<T: serde::de::DeserializeOwned>(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let response = ensure_success(provider, response).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::malformed(provider, e.to_string()))
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push('…');
    }
    body
}
