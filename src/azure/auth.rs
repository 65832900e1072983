//! Azure Authentication
//!
//! Bearer tokens for Azure Resource Manager, taken from the Azure CLI login
//! (`az account get-access-token`) or from `AZURE_ACCESS_TOKEN`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::sync::RwLock;

/// Resource the tokens are requested for
pub const ARM_RESOURCE: &str = "https://management.azure.com/";

/// Environment variable holding a pre-issued access token
pub const TOKEN_ENV_VAR: &str = "AZURE_ACCESS_TOKEN";

/// Token expiry buffer - refresh tokens this much before they actually expire
/// This prevents using tokens that are about to expire during a request
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Default token TTL if we can't determine expiry (conservative: 30 minutes)
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Credential acquisition failure
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct AuthError(pub String);

enum TokenSource {
    /// Fixed token, never refreshed
    Static(String),
    /// `az account get-access-token`
    AzureCli,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    /// Check if this cached token is still valid
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Output of `az account get-access-token --output json`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliToken {
    access_token: String,
    /// Unix timestamp, present in az >= 2.54
    #[serde(default, rename = "expires_on")]
    expires_on: Option<i64>,
}

/// Azure credentials holder with token caching
#[derive(Clone)]
pub struct AzureCredentials {
    source: Arc<TokenSource>,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

impl AzureCredentials {
    /// Use `AZURE_ACCESS_TOKEN` when set, the Azure CLI otherwise
    pub fn from_environment() -> Self {
        match std::env::var(TOKEN_ENV_VAR) {
            Ok(token) if !token.trim().is_empty() => {
                tracing::info!("Using access token from {}", TOKEN_ENV_VAR);
                Self::with_static_token(token.trim())
            },
            _ => Self::azure_cli(),
        }
    }

    pub fn azure_cli() -> Self {
        Self::from_source(TokenSource::AzureCli)
    }

    pub fn with_static_token(token: &str) -> Self {
        Self::from_source(TokenSource::Static(token.to_string()))
    }

    fn from_source(source: TokenSource) -> Self {
        Self {
            source: Arc::new(source),
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Get an access token for API calls
    /// Security: Checks token expiry before returning cached token
    pub async fn get_token(&self) -> Result<String> {
        if let TokenSource::Static(token) = self.source.as_ref() {
            return Ok(token.clone());
        }

        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached token expired, fetching new token");
            }
        }

        let (token, ttl) = fetch_cli_token().await?;
        let expires_at = Instant::now() + ttl.saturating_sub(TOKEN_EXPIRY_BUFFER);

        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken {
                token: token.clone(),
                expires_at,
            });
        }

        tracing::debug!(
            "New token cached, expires in ~{} minutes",
            ttl.saturating_sub(TOKEN_EXPIRY_BUFFER).as_secs() / 60
        );

        Ok(token)
    }

    /// Force refresh the token
    pub async fn refresh_token(&self) -> Result<String> {
        {
            let mut cache = self.token_cache.write().await;
            *cache = None;
        }

        self.get_token().await
    }
}

fn az_program() -> &'static str {
    if cfg!(windows) {
        "az.cmd"
    } else {
        "az"
    }
}

/// Ask the Azure CLI for a token; returns the token and its remaining lifetime
async fn fetch_cli_token() -> Result<(String, Duration)> {
    tracing::debug!("Requesting access token from Azure CLI");

    let output = Command::new(az_program())
        .args([
            "account",
            "get-access-token",
            "--resource",
            ARM_RESOURCE,
            "--output",
            "json",
        ])
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| AuthError(format!("Failed to run Azure CLI: {}", e)))
        .context("Azure CLI not found. Install it and run 'az login'")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        // Security: stderr may echo account details, log only the first line
        let first_line = stderr.lines().next().unwrap_or_default();
        tracing::error!("az account get-access-token failed: {}", first_line);
        return Err(AuthError("Azure CLI is not logged in. Run 'az login'".to_string()).into());
    }

    parse_cli_token(&output.stdout, chrono::Utc::now().timestamp())
}

fn parse_cli_token(stdout: &[u8], now: i64) -> Result<(String, Duration)> {
    let parsed: CliToken = serde_json::from_slice(stdout)
        .map_err(|e| AuthError(format!("Unexpected Azure CLI output: {}", e)))?;

    let ttl = parsed
        .expires_on
        .map(|expires_on| Duration::from_secs(expires_on.saturating_sub(now).max(0) as u64))
        .unwrap_or(DEFAULT_TOKEN_TTL);

    Ok((parsed.access_token, ttl))
}
