//! Provider client seam
//!
//! Everything that talks to the cloud goes through [`Provider`]. The Azure
//! implementation lives in `crate::azure`; tests plug in scripted ones.

use super::model::{Subscription, VmDescriptor};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Failure of a single provider call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("API request failed: {status}")]
    Api { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// HTTP status behind the failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Cloud operations the core needs
#[async_trait]
pub trait Provider: Send + Sync {
    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, ProviderError>;

    async fn list_virtual_machines(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<VmDescriptor>, ProviderError>;

    /// Status codes of the VM's instance view
    async fn instance_view(
        &self,
        subscription_id: &str,
        resource_group: &str,
        name: &str,
    ) -> Result<Vec<String>, ProviderError>;

    /// Public IP of the VM; `Ok(None)` when none is configured
    async fn public_address(
        &self,
        subscription_id: &str,
        resource_group: &str,
        vm: &VmDescriptor,
    ) -> Result<Option<String>, ProviderError>;

    async fn begin_start(
        &self,
        subscription_id: &str,
        resource_group: &str,
        name: &str,
    ) -> Result<(), ProviderError>;

    async fn begin_deallocate(
        &self,
        subscription_id: &str,
        resource_group: &str,
        name: &str,
    ) -> Result<(), ProviderError>;

    async fn begin_restart(
        &self,
        subscription_id: &str,
        resource_group: &str,
        name: &str,
    ) -> Result<(), ProviderError>;
}

/// Bound a provider call by `limit`; expiry becomes [`ProviderError::Timeout`]
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(limit)),
    }
}
