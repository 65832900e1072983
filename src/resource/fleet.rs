//! Fleet facade
//!
//! Wires directory, poller and dispatcher around one provider and exposes
//! the operations a presentation layer needs.

use super::directory::{Directory, DirectoryEvent, DirectorySnapshot};
use super::dispatcher::{DispatchReceipt, Dispatcher};
use super::error::FleetError;
use super::model::{Action, PendingCommand, Resource, Scope, Subscription};
use super::poller::{AutoPollHandle, PollReport, Poller};
use super::provider::{with_timeout, Provider};
use super::summary::Summary;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};

/// Default interval between auto-poll passes
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Timing knobs of the core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FleetConfig {
    /// Upper bound for every provider call
    pub call_timeout: Duration,
    /// Delay before the status re-check that follows a dispatch
    pub recheck_delay: Duration,
    /// Resources probed concurrently within one poll pass
    pub poll_concurrency: usize,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(15),
            recheck_delay: Duration::from_secs(1),
            poll_concurrency: 8,
        }
    }
}

pub struct Fleet {
    provider: Arc<dyn Provider>,
    config: FleetConfig,
    directory: Directory,
    poller: Poller,
    dispatcher: Dispatcher,
    subscriptions: RwLock<Vec<Subscription>>,
    auto_poll: Mutex<Option<AutoPollHandle>>,
}

impl Fleet {
    pub fn new(provider: Arc<dyn Provider>, config: FleetConfig) -> Self {
        let directory = Directory::new();
        let poller = Poller::new(
            directory.clone(),
            provider.clone(),
            config.call_timeout,
            config.poll_concurrency,
        );
        let dispatcher = Dispatcher::new(
            directory.clone(),
            provider.clone(),
            poller.clone(),
            config.call_timeout,
            config.recheck_delay,
        );

        Self {
            provider,
            config,
            directory,
            poller,
            dispatcher,
            subscriptions: RwLock::new(Vec::new()),
            auto_poll: Mutex::new(None),
        }
    }

    pub fn config(&self) -> FleetConfig {
        self.config
    }

    /// Fetch the subscription list from the provider and cache it
    pub async fn list_subscriptions(&self) -> Result<Vec<Subscription>, FleetError> {
        let subscriptions = with_timeout(self.config.call_timeout, self.provider.list_subscriptions())
            .await
            .map_err(|e| FleetError::enumeration("subscriptions", e))?;
        tracing::info!("Loaded {} subscriptions", subscriptions.len());
        *self.subscriptions.write().await = subscriptions.clone();
        Ok(subscriptions)
    }

    /// Subscriptions from the last successful listing
    pub async fn subscriptions(&self) -> Vec<Subscription> {
        self.subscriptions.read().await.clone()
    }

    /// Rebuild the directory for `scope`; returns the number of resources
    pub async fn refresh(&self, scope: &Scope) -> Result<usize, FleetError> {
        let in_scope = match scope {
            Scope::All => self.list_subscriptions().await?,
            Scope::Subscription(key) => {
                let mut found = self.find_subscription(key).await;
                if found.is_none() {
                    // Cache may be cold or outdated
                    self.list_subscriptions().await?;
                    found = self.find_subscription(key).await;
                }
                let sub = found.ok_or_else(|| FleetError::UnknownSubscription(key.clone()))?;
                vec![sub]
            },
        };

        let replaced = self
            .directory
            .refresh(
                self.provider.as_ref(),
                &in_scope,
                scope.label(),
                self.config.call_timeout,
            )
            .await?;
        Ok(replaced.count)
    }

    async fn find_subscription(&self, key: &str) -> Option<Subscription> {
        self.subscriptions
            .read()
            .await
            .iter()
            .find(|s| s.matches(key))
            .cloned()
    }

    /// Every tracked resource, in display order
    pub async fn all(&self) -> DirectorySnapshot {
        self.directory.all().await
    }

    pub async fn get(&self, id: &str) -> Result<Resource, FleetError> {
        self.directory.get(id).await
    }

    pub async fn summary(&self) -> Summary {
        Summary::from_snapshot(&self.directory.all().await)
    }

    pub async fn dispatch(
        &self,
        action: Action,
        resource_id: &str,
    ) -> Result<DispatchReceipt, FleetError> {
        self.dispatcher.dispatch(action, resource_id).await
    }

    pub async fn pending_commands(&self) -> Vec<PendingCommand> {
        self.dispatcher.pending_commands().await
    }

    pub async fn poll_once(&self) -> PollReport {
        self.poller.poll_once().await
    }

    /// Start periodic polling; an already running loop is replaced
    pub async fn start_auto_poll(&self, interval: Duration) {
        let handle = self.poller.start_auto_poll(interval);
        if let Some(previous) = self.auto_poll.lock().await.replace(handle) {
            previous.stop();
        }
    }

    /// Stop periodic polling; an in-flight pass still completes
    pub async fn stop_auto_poll(&self) {
        if let Some(handle) = self.auto_poll.lock().await.take() {
            handle.stop();
        }
    }

    pub async fn is_auto_polling(&self) -> bool {
        self.auto_poll
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Notifications fired whenever the directory content changes
    pub fn subscribe(&self) -> broadcast::Receiver<DirectoryEvent> {
        self.directory.subscribe()
    }
}
