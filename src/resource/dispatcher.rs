//! Command Dispatcher
//!
//! Submits start/stop/restart requests and schedules one delayed status
//! re-check of the targeted VM. The provider-side operation itself is never
//! awaited.

use super::directory::Directory;
use super::error::FleetError;
use super::ident;
use super::model::{Action, PendingCommand};
use super::poller::Poller;
use super::provider::{with_timeout, Provider};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Confirmation that a command was accepted by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReceipt {
    pub command_id: Uuid,
    pub resource_id: String,
    pub resource_name: String,
    pub action: Action,
    pub issued_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct Dispatcher {
    directory: Directory,
    provider: Arc<dyn Provider>,
    poller: Poller,
    call_timeout: Duration,
    recheck_delay: Duration,
    pending: Arc<Mutex<Vec<PendingCommand>>>,
}

impl Dispatcher {
    pub fn new(
        directory: Directory,
        provider: Arc<dyn Provider>,
        poller: Poller,
        call_timeout: Duration,
        recheck_delay: Duration,
    ) -> Self {
        Self {
            directory,
            provider,
            poller,
            call_timeout,
            recheck_delay,
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Issue `action` against the resource with `resource_id`.
    ///
    /// Returns once the provider accepted the request; the follow-up status
    /// check runs in the background after the re-check delay.
    pub async fn dispatch(
        &self,
        action: Action,
        resource_id: &str,
    ) -> Result<DispatchReceipt, FleetError> {
        let resource = self
            .directory
            .get(resource_id)
            .await
            .map_err(|_| FleetError::ResourceNotFound(resource_id.to_string()))?;
        let resource_group = ident::resource_group(&resource.id)?;
        let sub = resource.subscription_id.as_str();
        let name = resource.name.as_str();

        tracing::info!(
            "dispatch: action={}, resource={}, group={}",
            action.operation(),
            name,
            resource_group
        );

        let submitted = match action {
            Action::Start => {
                with_timeout(
                    self.call_timeout,
                    self.provider.begin_start(sub, &resource_group, name),
                )
                .await
            },
            Action::Stop => {
                with_timeout(
                    self.call_timeout,
                    self.provider.begin_deallocate(sub, &resource_group, name),
                )
                .await
            },
            Action::Restart => {
                with_timeout(
                    self.call_timeout,
                    self.provider.begin_restart(sub, &resource_group, name),
                )
                .await
            },
        };
        if let Err(e) = submitted {
            tracing::error!("{} of {} was rejected: {}", action, name, e);
            return Err(FleetError::Provider(e));
        }

        let command = PendingCommand {
            command_id: Uuid::new_v4(),
            resource_id: resource.id.clone(),
            action,
            issued_at: Utc::now(),
        };
        self.pending.lock().await.push(command.clone());
        self.schedule_recheck(command.command_id, resource.id.clone());

        Ok(DispatchReceipt {
            command_id: command.command_id,
            resource_id: resource.id,
            resource_name: resource.name,
            action,
            issued_at: command.issued_at,
        })
    }

    fn schedule_recheck(&self, command_id: Uuid, resource_id: String) {
        let poller = self.poller.clone();
        let pending = self.pending.clone();
        let delay = self.recheck_delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let report = poller.poll_resource(&resource_id).await;
            tracing::debug!(
                "Re-check of {} done (changed={})",
                resource_id,
                report.changed
            );
            pending.lock().await.retain(|c| c.command_id != command_id);
        });
    }

    /// Commands whose follow-up check has not completed yet
    pub async fn pending_commands(&self) -> Vec<PendingCommand> {
        self.pending.lock().await.clone()
    }
}
