//! Azure Networking
//!
//! Public IP lookup through a VM's network interfaces.

use super::client::{AzureClient, API_VERSION_NETWORK};
use crate::resource::VmDescriptor;
use anyhow::{Context, Result};
use serde_json::Value;

/// Public IP resource ids referenced by a NIC's IP configurations
fn public_ip_ids(nic: &Value) -> Vec<String> {
    nic.pointer("/properties/ipConfigurations")
        .and_then(|v| v.as_array())
        .map(|configs| {
            configs
                .iter()
                .filter_map(|c| c.pointer("/properties/publicIPAddress/id"))
                .filter_map(|v| v.as_str())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// First public IP address attached to the VM, if any
pub async fn public_address(client: &AzureClient, vm: &VmDescriptor) -> Result<Option<String>> {
    for nic_id in &vm.network_interface_ids {
        let nic = client
            .get(&client.arm_url(nic_id, API_VERSION_NETWORK))
            .await
            .with_context(|| format!("Failed to get network interface {}", nic_id))?;

        // Only the first IP configuration with a public IP counts
        if let Some(ip_id) = public_ip_ids(&nic).into_iter().next() {
            let ip = client
                .get(&client.arm_url(&ip_id, API_VERSION_NETWORK))
                .await
                .with_context(|| format!("Failed to get public IP {}", ip_id))?;

            return Ok(ip
                .pointer("/properties/ipAddress")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()));
        }
    }

    Ok(None)
}
