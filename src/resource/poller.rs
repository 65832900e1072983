//! Status Poller
//!
//! Refreshes power state and public address of every tracked VM. A failed
//! lookup only degrades that VM's fields (`Unknown`, no address); the pass
//! always continues with the remaining VMs.

use super::directory::{Directory, DirectorySnapshot};
use super::model::{PowerState, Resource};
use super::provider::{with_timeout, Provider};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Outcome of one poll pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Resources probed
    pub polled: usize,
    /// Resources whose stored state changed
    pub changed: usize,
    /// Lookups that failed and fell back to a sentinel
    pub failures: usize,
}

/// Live status of one VM as seen by a probe
#[derive(Debug, Clone, PartialEq, Eq)]
struct Probe {
    power_state: PowerState,
    public_address: Option<String>,
    failures: usize,
}

#[derive(Clone)]
pub struct Poller {
    directory: Directory,
    provider: Arc<dyn Provider>,
    call_timeout: Duration,
    concurrency: usize,
}

impl Poller {
    pub fn new(
        directory: Directory,
        provider: Arc<dyn Provider>,
        call_timeout: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            directory,
            provider,
            call_timeout,
            concurrency: concurrency.max(1),
        }
    }

    /// Poll every resource currently in the directory
    pub async fn poll_once(&self) -> PollReport {
        let snapshot = self.directory.all().await;
        self.poll_snapshot(snapshot).await
    }

    /// Poll a single resource; an id that is no longer tracked is a no-op
    pub async fn poll_resource(&self, id: &str) -> PollReport {
        let snapshot = self.directory.select(id).await;
        if snapshot.is_empty() {
            tracing::debug!("poll_resource: {} no longer tracked, skipping", id);
        }
        self.poll_snapshot(snapshot).await
    }

    async fn poll_snapshot(&self, snapshot: DirectorySnapshot) -> PollReport {
        let generation = snapshot.generation;
        let polled = snapshot.len();

        let outcomes: Vec<(bool, usize)> = stream::iter(snapshot.into_vec())
            .map(|resource| async move {
                let probe = self.probe(&resource).await;
                let changed = self
                    .directory
                    .apply_status(
                        generation,
                        &resource.id,
                        probe.power_state,
                        probe.public_address,
                    )
                    .await;
                (changed, probe.failures)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let report = PollReport {
            polled,
            changed: outcomes.iter().filter(|(changed, _)| *changed).count(),
            failures: outcomes.iter().map(|(_, failures)| failures).sum(),
        };
        tracing::debug!(
            "Poll pass done: polled={}, changed={}, failures={}",
            report.polled,
            report.changed,
            report.failures
        );
        report
    }

    async fn probe(&self, resource: &Resource) -> Probe {
        let Some(resource_group) = resource.resource_group.as_deref() else {
            tracing::warn!("Cannot poll {}: no resource group in identifier", resource.id);
            return Probe {
                power_state: PowerState::Unknown,
                public_address: None,
                failures: 1,
            };
        };

        let mut failures = 0;
        let sub = resource.subscription_id.as_str();

        let power_state = match with_timeout(
            self.call_timeout,
            self.provider.instance_view(sub, resource_group, &resource.name),
        )
        .await
        {
            Ok(codes) => PowerState::from_status_codes(&codes),
            Err(e) => {
                tracing::warn!("Instance view of {} failed: {}", resource.name, e);
                failures += 1;
                PowerState::Unknown
            },
        };

        let public_address = match with_timeout(
            self.call_timeout,
            self.provider
                .public_address(sub, resource_group, &resource.descriptor),
        )
        .await
        {
            Ok(address) => address,
            Err(e) => {
                tracing::warn!("Public address of {} failed: {}", resource.name, e);
                failures += 1;
                None
            },
        };

        Probe {
            power_state,
            public_address,
            failures,
        }
    }

    /// Run `poll_once` every `interval` until the returned handle is stopped.
    ///
    /// The first pass starts immediately; the next one is scheduled only after
    /// the previous pass applied its updates, so passes never overlap.
    pub fn start_auto_poll(&self, interval: Duration) -> AutoPollHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let poller = self.clone();

        let task = tokio::spawn(async move {
            tracing::info!("Auto-poll started (every {:?})", interval);
            loop {
                if *stop_rx.borrow() {
                    break;
                }
                // Not raced against the stop signal: an in-flight pass completes.
                poller.poll_once().await;

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {},
                    changed = stop_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    },
                }
            }
            tracing::info!("Auto-poll stopped");
        });

        AutoPollHandle {
            stop: stop_tx,
            task: Some(task),
        }
    }
}

/// Control handle of a running auto-poll loop
pub struct AutoPollHandle {
    stop: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl AutoPollHandle {
    /// Prevent any further pass from starting
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// Stop and wait for an in-flight pass to finish
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("Auto-poll task failed: {}", e);
            }
        }
    }
}

impl Drop for AutoPollHandle {
    fn drop(&mut self) {
        let _ = self.stop.send(true);
    }
}
