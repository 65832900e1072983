//! Azure Subscriptions
//!
//! Functions for listing subscriptions visible to the signed-in account.

use super::client::AzureClient;
use crate::resource::Subscription;
use anyhow::Result;
use serde_json::Value;

/// Subscription states that can no longer hold usable VMs
const INACTIVE_STATES: &[&str] = &["Disabled", "Deleted"];

fn parse_subscription(value: &Value) -> Option<Subscription> {
    let id = value.get("subscriptionId").and_then(|v| v.as_str())?;
    let display_name = value
        .get("displayName")
        .and_then(|v| v.as_str())
        .unwrap_or(id);
    Some(Subscription::new(id, display_name))
}

fn is_active(value: &Value) -> bool {
    value
        .get("state")
        .and_then(|v| v.as_str())
        .map(|s| !INACTIVE_STATES.contains(&s))
        .unwrap_or(true)
}

/// List all usable subscriptions
pub async fn list_subscriptions(client: &AzureClient) -> Result<Vec<Subscription>> {
    let url = client.subscriptions_url();
    let values = client.get_all_pages(&url).await?;

    let subscriptions = values
        .iter()
        .filter(|v| is_active(v))
        .filter_map(parse_subscription)
        .collect();

    Ok(subscriptions)
}
