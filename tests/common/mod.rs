//! Scripted in-memory provider shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use tazvm::resource::{Provider, ProviderError, Subscription, VmDescriptor};

/// A provider call as observed by [`ScriptedProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListSubscriptions,
    ListVms(String),
    InstanceView { sub: String, rg: String, name: String },
    PublicAddress(String),
    Start { sub: String, rg: String, name: String },
    Deallocate { sub: String, rg: String, name: String },
    Restart { sub: String, rg: String, name: String },
}

impl Call {
    pub fn is_command(&self) -> bool {
        matches!(
            self,
            Call::Start { .. } | Call::Deallocate { .. } | Call::Restart { .. }
        )
    }
}

pub fn vm_id(sub: &str, rg: &str, name: &str) -> String {
    format!(
        "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Compute/virtualMachines/{}",
        sub, rg, name
    )
}

#[derive(Default)]
pub struct ScriptedProvider {
    subscriptions: Mutex<Vec<Subscription>>,
    vms: Mutex<HashMap<String, Vec<VmDescriptor>>>,
    statuses: Mutex<HashMap<String, Vec<String>>>,
    addresses: Mutex<HashMap<String, String>>,
    failing_listings: Mutex<HashSet<String>>,
    failing_views: Mutex<HashSet<String>>,
    reject_commands: Mutex<bool>,
    view_delay: Mutex<Option<Duration>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_subscription(&self, id: &str, name: &str) {
        self.subscriptions
            .lock()
            .unwrap()
            .push(Subscription::new(id, name));
        self.vms.lock().unwrap().entry(id.to_string()).or_default();
    }

    /// Register a VM under `sub`; returns its identifier
    pub fn add_vm(&self, sub: &str, rg: &str, name: &str) -> String {
        let id = vm_id(sub, rg, name);
        self.add_descriptor(sub, VmDescriptor::new(&id, name));
        id
    }

    pub fn add_descriptor(&self, sub: &str, descriptor: VmDescriptor) {
        self.vms
            .lock()
            .unwrap()
            .entry(sub.to_string())
            .or_default()
            .push(descriptor);
    }

    pub fn set_status(&self, name: &str, codes: &[&str]) {
        self.statuses.lock().unwrap().insert(
            name.to_string(),
            codes.iter().map(|c| c.to_string()).collect(),
        );
    }

    pub fn set_address(&self, name: &str, address: &str) {
        self.addresses
            .lock()
            .unwrap()
            .insert(name.to_string(), address.to_string());
    }

    pub fn fail_listing(&self, sub: &str) {
        self.failing_listings.lock().unwrap().insert(sub.to_string());
    }

    pub fn fail_instance_view(&self, name: &str) {
        self.failing_views.lock().unwrap().insert(name.to_string());
    }

    pub fn reject_commands(&self) {
        *self.reject_commands.lock().unwrap() = true;
    }

    /// Make every instance view call take `delay` (tokio time)
    pub fn set_view_delay(&self, delay: Duration) {
        *self.view_delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    pub fn instance_view_count(&self) -> usize {
        self.count(|c| matches!(c, Call::InstanceView { .. }))
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn command(&self, call: Call) -> Result<(), ProviderError> {
        self.record(call);
        if *self.reject_commands.lock().unwrap() {
            return Err(ProviderError::Api {
                status: 409,
                message: "Conflict".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, ProviderError> {
        self.record(Call::ListSubscriptions);
        Ok(self.subscriptions.lock().unwrap().clone())
    }

    async fn list_virtual_machines(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<VmDescriptor>, ProviderError> {
        self.record(Call::ListVms(subscription_id.to_string()));
        if self.failing_listings.lock().unwrap().contains(subscription_id) {
            return Err(ProviderError::Api {
                status: 403,
                message: "AuthorizationFailed".to_string(),
            });
        }
        Ok(self
            .vms
            .lock()
            .unwrap()
            .get(subscription_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn instance_view(
        &self,
        subscription_id: &str,
        resource_group: &str,
        name: &str,
    ) -> Result<Vec<String>, ProviderError> {
        self.record(Call::InstanceView {
            sub: subscription_id.to_string(),
            rg: resource_group.to_string(),
            name: name.to_string(),
        });
        let codes = self
            .statuses
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_default();
        let failing = self.failing_views.lock().unwrap().contains(name);
        let delay = *self.view_delay.lock().unwrap();

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if failing {
            return Err(ProviderError::Transport("connection reset".to_string()));
        }
        Ok(codes)
    }

    async fn public_address(
        &self,
        _subscription_id: &str,
        _resource_group: &str,
        vm: &VmDescriptor,
    ) -> Result<Option<String>, ProviderError> {
        self.record(Call::PublicAddress(vm.name.clone()));
        Ok(self.addresses.lock().unwrap().get(&vm.name).cloned())
    }

    async fn begin_start(
        &self,
        subscription_id: &str,
        resource_group: &str,
        name: &str,
    ) -> Result<(), ProviderError> {
        self.command(Call::Start {
            sub: subscription_id.to_string(),
            rg: resource_group.to_string(),
            name: name.to_string(),
        })
    }

    async fn begin_deallocate(
        &self,
        subscription_id: &str,
        resource_group: &str,
        name: &str,
    ) -> Result<(), ProviderError> {
        self.command(Call::Deallocate {
            sub: subscription_id.to_string(),
            rg: resource_group.to_string(),
            name: name.to_string(),
        })
    }

    async fn begin_restart(
        &self,
        subscription_id: &str,
        resource_group: &str,
        name: &str,
    ) -> Result<(), ProviderError> {
        self.command(Call::Restart {
            sub: subscription_id.to_string(),
            rg: resource_group.to_string(),
            name: name.to_string(),
        })
    }
}
