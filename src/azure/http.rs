//! HTTP utilities for Azure Resource Manager calls

use crate::resource::ProviderError;
use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Connect timeout for ARM requests; overall call timeouts are applied by the core
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.chars().count() > MAX_LOG_BODY_LENGTH {
        let head: String = body.chars().take(MAX_LOG_BODY_LENGTH).collect();
        format!("{}... [truncated, {} bytes total]", head, body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Non-success HTTP status returned by ARM
#[derive(Debug, Clone, thiserror::Error)]
#[error("API request failed: {status}")]
pub struct ApiError {
    pub status: u16,
    /// ARM error code (`error.code`), e.g. `ResourceNotFound`
    pub code: Option<String>,
}

impl ApiError {
    fn from_body(status: u16, body: &str) -> Self {
        let code = serde_json::from_str::<Value>(body).ok().and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("code"))
                .and_then(|c| c.as_str())
                .map(|s| s.to_string())
        });
        Self { status, code }
    }
}

/// HTTP client wrapper for ARM calls
#[derive(Clone)]
pub struct AzureHttpClient {
    client: Client,
}

impl AzureHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("tazvm/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Make a GET request
    pub async fn get(&self, url: &str, token: &str) -> Result<Value> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to send request")?;

        let body = read_body(response).await?;
        if body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).context("Failed to parse response JSON")
    }

    /// Make a POST request without a body (ARM long-running actions)
    pub async fn post(&self, url: &str, token: &str) -> Result<Value> {
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_LENGTH, 0)
            .send()
            .await
            .context("Failed to send request")?;

        let body = read_body(response).await?;

        // 202 Accepted usually comes back empty
        if body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).context("Failed to parse response JSON")
    }
}

/// Read the body, turning a non-success status into [`ApiError`]
async fn read_body(response: Response) -> Result<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .context("Failed to read response body")?;

    if !status.is_success() {
        // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
        tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
        return Err(ApiError::from_body(status.as_u16(), &body).into());
    }

    Ok(body)
}

/// Classify an HTTP-layer failure for the core
pub fn to_provider_error(error: anyhow::Error) -> ProviderError {
    if let Some(api) = error.downcast_ref::<ApiError>() {
        let message = api.code.clone().unwrap_or_default();
        return match api.status {
            401 => ProviderError::Auth(message),
            status => ProviderError::Api { status, message },
        };
    }
    if let Some(auth) = error.downcast_ref::<super::auth::AuthError>() {
        return ProviderError::Auth(auth.to_string());
    }
    if error.downcast_ref::<reqwest::Error>().is_some() {
        return ProviderError::Transport(format!("{:#}", error));
    }
    if error.downcast_ref::<serde_json::Error>().is_some() {
        return ProviderError::Decode(format!("{:#}", error));
    }
    ProviderError::Other(format!("{:#}", error))
}

/// Format a provider error for display
/// Security: Sanitizes error messages to avoid leaking sensitive API details
pub fn format_azure_error(error: &ProviderError) -> String {
    match error {
        ProviderError::Auth(_) => {
            "Authentication failed. Run 'az login' and try again.".to_string()
        },
        ProviderError::Timeout(limit) => {
            format!("Azure did not answer within {}s. Please try again.", limit.as_secs())
        },
        ProviderError::Api { status, message } => match status {
            403 => "Permission denied. Check your Azure RBAC role assignments.".to_string(),
            404 => "Resource not found.".to_string(),
            409 => "Conflict. Another operation may be in progress on this VM.".to_string(),
            429 => "Rate limit exceeded. Please try again later.".to_string(),
            400 if !message.is_empty() => format!("Invalid request ({}).", truncate(message, 40)),
            400 => "Invalid request. Check your parameters.".to_string(),
            500..=599 => "Azure service temporarily unavailable. Please try again.".to_string(),
            _ => "Request failed. Check your network connection and try again.".to_string(),
        },
        ProviderError::Transport(_) => {
            "Could not reach Azure. Check your network connection.".to_string()
        },
        ProviderError::Decode(_) => "Unexpected response from Azure.".to_string(),
        ProviderError::Other(message) => truncate(message, 80),
    }
}

fn truncate(message: &str, max: usize) -> String {
    let sanitized: String = message
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .collect();

    if sanitized.chars().count() > max {
        let head: String = sanitized.chars().take(max).collect();
        format!("{}...", head)
    } else {
        sanitized
    }
}
