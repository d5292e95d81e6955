//! Shared HTTP client and response handling for provider APIs.
//!
//! Every adapter sends requests through [`send`], which turns transport
//! failures and non-success statuses into [`ServiceError`] values the retry
//! layer can classify (429 → `RateLimited`, anything else → `Status`).

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use retrieval_core::{Result, ServiceError};
use serde::de::DeserializeOwned;

use crate::config::HttpConfig;

/// User-Agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("retrieval-services/", env!("CARGO_PKG_VERSION"));

/// Build a [`reqwest::Client`] for provider API calls.
///
/// # Errors
///
/// Returns [`ServiceError::Config`] if the client cannot be constructed.
pub fn build_client(config: &HttpConfig) -> Result<reqwest::Client> {
    config.validate()?;
    let ua = config
        .user_agent
        .clone()
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned());

    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(ua)
        .build()
        .map_err(|e| ServiceError::Config(format!("failed to build HTTP client: {e}")))
}

/// Send `request` and return the response if its status is a success.
///
/// # Errors
///
/// - [`ServiceError::Request`] when no response arrives
/// - [`ServiceError::RateLimited`] for HTTP 429
/// - [`ServiceError::Status`] for any other non-success status
pub async fn send(provider: &str, request: RequestBuilder) -> Result<Response> {
    let response = request
        .send()
        .await
        .map_err(|e| ServiceError::Request(format!("{provider} request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(provider, status = %status, "provider returned error status");
        return Err(map_http_error(provider, status, &body));
    }
    Ok(response)
}

/// Send `request` and decode a JSON body into `T`.
///
/// # Errors
///
/// Same as [`send`], plus [`ServiceError::Response`] if the body is not the
/// expected JSON shape.
pub async fn send_json<T: DeserializeOwned>(provider: &str, request: RequestBuilder) -> Result<T> {
    let response = send(provider, request).await?;
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ServiceError::Request(format!("{provider} response read failed: {e}")))?;
    tracing::trace!(provider, bytes = bytes.len(), "response received");
    serde_json::from_slice(&bytes)
        .map_err(|e| ServiceError::Response(format!("{provider} returned unexpected JSON: {e}")))
}

/// Send `request` and return the body as text.
///
/// # Errors
///
/// Same as [`send`].
pub async fn send_text(provider: &str, request: RequestBuilder) -> Result<String> {
    let response = send(provider, request).await?;
    response
        .text()
        .await
        .map_err(|e| ServiceError::Request(format!("{provider} response read failed: {e}")))
}

/// Map an HTTP error status to the appropriate [`ServiceError`].
pub fn map_http_error(provider: &str, status: StatusCode, body: &str) -> ServiceError {
    let message = extract_error_message(body);
    match status {
        StatusCode::TOO_MANY_REQUESTS => ServiceError::RateLimited {
            provider: provider.to_string(),
            message,
        },
        _ => ServiceError::Status {
            provider: provider.to_string(),
            status: status.as_u16(),
            message,
        },
    }
}

/// Extract an error message from a provider error body.
///
/// Understands `{"error": {"message": ..}}` (Google, Pinecone),
/// `{"error": ".."}`, and `{"message": ".."}` (Semantic Scholar); falls
/// back to the raw body.
fn extract_error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message").or(Some(e)))
                .or_else(|| v.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
