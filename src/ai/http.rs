//! HTTP plumbing shared by every provider adapter.
//!
//! Turns transport failures, non-success statuses and undecodable bodies into
//! `ProviderError::InvocationFailed` with a classified category.

use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::types::{ErrorCategory, GenError, ProviderError};

/// Build a client with the given request timeout
pub fn build_client(timeout_secs: u64) -> Result<reqwest::Client, GenError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| GenError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Validate and normalize an API base URL (http/https only, no trailing slash)
pub fn normalize_base_url(provider: &str, base: &str) -> Result<String, GenError> {
    let url = url::Url::parse(base).map_err(|e| {
        GenError::Config(format!("Invalid {} endpoint URL '{}': {}", provider, base, e))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(GenError::Config(format!(
            "{} endpoint must use http or https scheme, got: {}",
            provider,
            url.scheme()
        )));
    }

    let mut result = url.to_string();
    while result.ends_with('/') {
        result.pop();
    }
    Ok(result)
}

/// Send a request, returning the response only when the status is a success
pub async fn send(provider: &str, request: RequestBuilder) -> Result<Response, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::from_transport(provider, &e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::from_status(provider, status.as_u16(), &body));
    }

    Ok(response)
}

/// Send a request and decode a successful JSON body
pub async fn send_json<T: DeserializeOwned>(
    provider: &str,
    request: RequestBuilder,
) -> Result<T, ProviderError> {
    let response = send(provider, request).await?;
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::from_transport(provider, &e))?;

    debug!(provider, bytes = body.len(), "Decoding provider response");
    decode_body(provider, &body)
}

/// Decode a JSON body, classifying failures as parse errors
pub fn decode_body<T: DeserializeOwned>(provider: &str, body: &str) -> Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|e| {
        ProviderError::invocation(
            provider,
            ErrorCategory::ParseError,
            format!("unexpected response shape: {}", e),
        )
    })
}
