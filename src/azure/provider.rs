//! [`Provider`] implementation backed by Azure Resource Manager

use super::client::AzureClient;
use super::http::to_provider_error;
use super::{compute, network, subscriptions};
use crate::resource::{Provider, ProviderError, Subscription, VmDescriptor};
use async_trait::async_trait;

#[async_trait]
impl Provider for AzureClient {
    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, ProviderError> {
        subscriptions::list_subscriptions(self)
            .await
            .map_err(to_provider_error)
    }

    async fn list_virtual_machines(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<VmDescriptor>, ProviderError> {
        compute::list_vms(self, subscription_id)
            .await
            .map_err(to_provider_error)
    }

    async fn instance_view(
        &self,
        subscription_id: &str,
        resource_group: &str,
        name: &str,
    ) -> Result<Vec<String>, ProviderError> {
        compute::instance_view_codes(self, subscription_id, resource_group, name)
            .await
            .map_err(to_provider_error)
    }

    async fn public_address(
        &self,
        _subscription_id: &str,
        _resource_group: &str,
        vm: &VmDescriptor,
    ) -> Result<Option<String>, ProviderError> {
        // NIC and public IP are addressed by their full ids
        network::public_address(self, vm)
            .await
            .map_err(to_provider_error)
    }

    async fn begin_start(
        &self,
        subscription_id: &str,
        resource_group: &str,
        name: &str,
    ) -> Result<(), ProviderError> {
        compute::begin_operation(self, subscription_id, resource_group, name, "start")
            .await
            .map_err(to_provider_error)
    }

    async fn begin_deallocate(
        &self,
        subscription_id: &str,
        resource_group: &str,
        name: &str,
    ) -> Result<(), ProviderError> {
        compute::begin_operation(self, subscription_id, resource_group, name, "deallocate")
            .await
            .map_err(to_provider_error)
    }

    async fn begin_restart(
        &self,
        subscription_id: &str,
        resource_group: &str,
        name: &str,
    ) -> Result<(), ProviderError> {
        compute::begin_operation(self, subscription_id, resource_group, name, "restart")
            .await
            .map_err(to_provider_error)
    }
}
