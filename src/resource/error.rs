//! Core error types

use super::provider::ProviderError;

/// Errors surfaced by the directory, dispatcher and fleet facade
#[derive(Debug, Clone, thiserror::Error)]
pub enum FleetError {
    /// A listing call failed during refresh; nothing was applied
    #[error("failed to enumerate {scope}: {source}")]
    Enumeration {
        scope: String,
        #[source]
        source: ProviderError,
    },
    /// Dispatch target is not in the directory
    #[error("resource not found: {0}")]
    ResourceNotFound(String),
    /// Identifier has no resource group segment
    #[error("malformed resource identifier: {0}")]
    MalformedIdentifier(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// Single lookup miss
    #[error("no resource with id {0}")]
    NotFound(String),
    /// Refresh scope names no known subscription
    #[error("unknown subscription: {0}")]
    UnknownSubscription(String),
}

impl FleetError {
    pub fn enumeration(scope: &str, source: ProviderError) -> Self {
        Self::Enumeration {
            scope: scope.to_string(),
            source,
        }
    }
}
