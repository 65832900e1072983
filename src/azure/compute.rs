//! Azure Compute
//!
//! Virtual machine listing, instance views and power operations.

use super::client::{AzureClient, API_VERSION_COMPUTE};
use crate::resource::VmDescriptor;
use anyhow::{Context, Result};
use serde_json::Value;

fn parse_vm(value: &Value) -> Option<VmDescriptor> {
    let id = value.get("id").and_then(|v| v.as_str())?;
    let name = value
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or_else(|| crate::resource::ident::short_name(id));

    let network_interface_ids = value
        .pointer("/properties/networkProfile/networkInterfaces")
        .and_then(|v| v.as_array())
        .map(|nics| {
            nics.iter()
                .filter_map(|nic| nic.get("id").and_then(|v| v.as_str()))
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default();

    Some(VmDescriptor {
        id: id.to_string(),
        name: name.to_string(),
        location: value
            .get("location")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        network_interface_ids,
    })
}

/// List every VM of a subscription
pub async fn list_vms(client: &AzureClient, subscription_id: &str) -> Result<Vec<VmDescriptor>> {
    let url = client.subscription_url(
        subscription_id,
        "/providers/Microsoft.Compute/virtualMachines",
        API_VERSION_COMPUTE,
    );
    let values = client.get_all_pages(&url).await?;

    let vms: Vec<VmDescriptor> = values.iter().filter_map(parse_vm).collect();
    if vms.len() != values.len() {
        tracing::warn!(
            "Skipped {} VM entries without an id in {}",
            values.len() - vms.len(),
            subscription_id
        );
    }
    Ok(vms)
}

/// Status codes of the VM instance view, in the order ARM reports them
pub async fn instance_view_codes(
    client: &AzureClient,
    subscription_id: &str,
    resource_group: &str,
    name: &str,
) -> Result<Vec<String>> {
    let url = client.vm_url(subscription_id, resource_group, name, Some("instanceView"));
    let response = client
        .get(&url)
        .await
        .with_context(|| format!("Failed to get instance view of {}", name))?;

    let codes = response
        .get("statuses")
        .and_then(|v| v.as_array())
        .map(|statuses| {
            statuses
                .iter()
                .filter_map(|s| s.get("code").and_then(|c| c.as_str()))
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default();

    Ok(codes)
}

/// Submit a power operation (`start`, `deallocate`, `restart`).
/// Returns as soon as ARM accepted the request.
pub async fn begin_operation(
    client: &AzureClient,
    subscription_id: &str,
    resource_group: &str,
    name: &str,
    operation: &str,
) -> Result<()> {
    let url = client.vm_url(subscription_id, resource_group, name, Some(operation));
    client
        .post(&url)
        .await
        .with_context(|| format!("Failed to {} {}", operation, name))?;
    tracing::info!("Submitted {} for {}/{}", operation, resource_group, name);
    Ok(())
}
