//! Shared HTTP plumbing for the remote providers

use crate::ProviderError;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Longest error body carried into a `ProviderError`
const MAX_ERROR_BODY: usize = 512;

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::Communication(format!("Failed to build HTTP client: {}", e)))
}

/// Send a request and decode a JSON success body
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    model: &str,
) -> Result<T, ProviderError> {
    let response = request.send().await.map_err(map_transport_error)?;
    let status = response.status();

    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(status_error(status, body, model));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))
}

fn map_transport_error(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Communication(format!("Request failed: {}", error))
    }
}

pub(crate) fn status_error(status: StatusCode, body: String, model: &str) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::Authentication(truncate(body))
        }
        StatusCode::NOT_FOUND => ProviderError::ModelNotAvailable(model.to_string()),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded,
        _ => ProviderError::Http {
            status: status.as_u16(),
            body: truncate(body),
        },
    }
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
        body.push_str("...");
    }
    body
}
