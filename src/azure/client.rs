//! Azure Client
//!
//! Main client for Azure Resource Manager, combining authentication
//! and HTTP functionality.

use super::auth::AzureCredentials;
use super::http::AzureHttpClient;
use anyhow::{Context, Result};
use serde_json::Value;
use url::Url;

/// Public cloud ARM endpoint
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

pub const API_VERSION_SUBSCRIPTIONS: &str = "2022-12-01";
pub const API_VERSION_COMPUTE: &str = "2024-03-01";
pub const API_VERSION_NETWORK: &str = "2024-01-01";

/// Upper bound on `nextLink` pages followed for one listing
const MAX_PAGES: usize = 100;

/// Main Azure client
#[derive(Clone)]
pub struct AzureClient {
    pub credentials: AzureCredentials,
    pub http: AzureHttpClient,
    endpoint: Url,
}

impl AzureClient {
    /// Create a client for the public cloud
    pub fn new(credentials: AzureCredentials) -> Result<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT, credentials)
    }

    /// Create a client for a custom ARM endpoint (sovereign clouds, tests)
    pub fn with_endpoint(endpoint: &str, credentials: AzureCredentials) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("Invalid ARM endpoint: {}", endpoint))?;
        if endpoint.cannot_be_a_base() {
            anyhow::bail!("Invalid ARM endpoint: {}", endpoint);
        }

        let http = AzureHttpClient::new()?;

        Ok(Self {
            credentials,
            http,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str().trim_end_matches('/')
    }

    /// Get the current access token
    pub async fn get_token(&self) -> Result<String> {
        self.credentials.get_token().await
    }

    /// Make a GET request to ARM
    pub async fn get(&self, url: &str) -> Result<Value> {
        let token = self.get_token().await?;
        self.http.get(url, &token).await
    }

    /// Make a POST request to ARM
    pub async fn post(&self, url: &str) -> Result<Value> {
        let token = self.get_token().await?;
        self.http.post(url, &token).await
    }

    /// GET a list endpoint and follow `nextLink` until exhausted
    pub async fn get_all_pages(&self, url: &str) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        let mut next = Some(url.to_string());
        let mut pages = 0;

        while let Some(page_url) = next.take() {
            pages += 1;
            if pages > MAX_PAGES {
                tracing::warn!("Stopping pagination after {} pages: {}", MAX_PAGES, url);
                break;
            }

            let response = self.get(&page_url).await?;
            if let Some(values) = response.get("value").and_then(|v| v.as_array()) {
                items.extend(values.iter().cloned());
            }

            next = response
                .get("nextLink")
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string());
        }

        Ok(items)
    }

    // =========================================================================
    // ARM URL helpers
    // =========================================================================

    /// Build an ARM URL from an absolute path (e.g. a full resource id)
    pub fn arm_url(&self, path: &str, api_version: &str) -> String {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        format!("{}{}?api-version={}", self.endpoint(), path, api_version)
    }

    /// Build the subscription list URL
    pub fn subscriptions_url(&self) -> String {
        self.arm_url("/subscriptions", API_VERSION_SUBSCRIPTIONS)
    }

    /// Build a URL below a subscription
    pub fn subscription_url(&self, subscription_id: &str, path: &str, api_version: &str) -> String {
        self.arm_url(
            &format!(
                "/subscriptions/{}{}",
                urlencoding::encode(subscription_id),
                path
            ),
            api_version,
        )
    }

    /// Build a URL below a resource group
    pub fn resource_group_url(
        &self,
        subscription_id: &str,
        resource_group: &str,
        path: &str,
        api_version: &str,
    ) -> String {
        self.subscription_url(
            subscription_id,
            &format!("/resourceGroups/{}{}", urlencoding::encode(resource_group), path),
            api_version,
        )
    }

    /// Build a URL for one virtual machine, optionally with a trailing operation
    pub fn vm_url(
        &self,
        subscription_id: &str,
        resource_group: &str,
        name: &str,
        operation: Option<&str>,
    ) -> String {
        let mut path = format!(
            "/providers/Microsoft.Compute/virtualMachines/{}",
            urlencoding::encode(name)
        );
        if let Some(op) = operation {
            path.push('/');
            path.push_str(op);
        }
        self.resource_group_url(subscription_id, resource_group, &path, API_VERSION_COMPUTE)
    }
}
