//! Resource Directory
//!
//! In-memory source of truth for the tracked VMs. A refresh swaps the whole
//! table under the write lock; status updates only take the read lock plus
//! the per-record mutex, so different VMs can be updated concurrently.

use super::error::FleetError;
use super::model::{PowerState, Resource, Subscription};
use super::provider::{with_timeout, Provider};
use futures::future::try_join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};

/// Capacity of the change-notification channel
const EVENT_CAPACITY: usize = 256;

/// Change notification published to subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryEvent {
    /// Content was replaced by a refresh
    Refreshed { generation: u64, count: usize },
    /// Power state or address of one VM changed
    Updated { id: String },
}

/// Result of swapping the directory content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Replaced {
    pub generation: u64,
    /// Resources kept after dropping duplicates
    pub count: usize,
}

#[derive(Default)]
struct Table {
    generation: u64,
    records: Vec<Arc<Mutex<Resource>>>,
    index: HashMap<String, usize>,
}

/// Point-in-time copy of the directory, in display order
#[derive(Debug, Clone, Default)]
pub struct DirectorySnapshot {
    pub generation: u64,
    resources: Vec<Resource>,
}

impl DirectorySnapshot {
    /// Iterate in directory order; can be called any number of times
    pub fn iter(&self) -> std::slice::Iter<'_, Resource> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Resource> {
        self.resources.get(index)
    }

    pub fn into_vec(self) -> Vec<Resource> {
        self.resources
    }
}

impl<'a> IntoIterator for &'a DirectorySnapshot {
    type Item = &'a Resource;
    type IntoIter = std::slice::Iter<'a, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Shared handle to the directory
#[derive(Clone)]
pub struct Directory {
    table: Arc<RwLock<Table>>,
    events: broadcast::Sender<DirectoryEvent>,
}

impl Default for Directory {
    fn default() -> Self {
        Self::new()
    }
}

impl Directory {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            table: Arc::new(RwLock::new(Table::default())),
            events,
        }
    }

    /// Receive a [`DirectoryEvent`] on every content change
    pub fn subscribe(&self) -> broadcast::Receiver<DirectoryEvent> {
        self.events.subscribe()
    }

    /// Enumerate the VMs of `subscriptions` and replace the directory with them.
    ///
    /// Any failed listing aborts the whole refresh and leaves the previous
    /// content in place.
    pub async fn refresh(
        &self,
        provider: &dyn Provider,
        subscriptions: &[Subscription],
        scope_label: &str,
        call_timeout: Duration,
    ) -> Result<Replaced, FleetError> {
        tracing::debug!(
            "refresh: scope={}, subscriptions={}",
            scope_label,
            subscriptions.len()
        );

        let listings = try_join_all(subscriptions.iter().map(|sub| async move {
            let vms = with_timeout(call_timeout, provider.list_virtual_machines(&sub.id))
                .await
                .map_err(|e| {
                    tracing::warn!("Listing VMs of subscription {} failed: {}", sub.id, e);
                    FleetError::enumeration(scope_label, e)
                })?;
            Ok::<_, FleetError>((sub, vms))
        }))
        .await?;

        let resources = listings
            .into_iter()
            .flat_map(|(sub, vms)| {
                vms.into_iter()
                    .map(move |vm| Resource::from_descriptor(sub, vm))
            })
            .collect();

        Ok(self.replace(resources).await)
    }

    /// Atomically replace the content, keeping the given order.
    /// Duplicate ids keep their first occurrence.
    pub async fn replace(&self, resources: Vec<Resource>) -> Replaced {
        let mut records = Vec::with_capacity(resources.len());
        let mut index = HashMap::with_capacity(resources.len());

        for resource in resources {
            if index.contains_key(&resource.id) {
                tracing::warn!("Skipping duplicate resource {}", resource.id);
                continue;
            }
            index.insert(resource.id.clone(), records.len());
            records.push(Arc::new(Mutex::new(resource)));
        }

        let count = records.len();
        let generation = {
            let mut table = self.table.write().await;
            table.generation += 1;
            table.records = records;
            table.index = index;
            table.generation
        };

        tracing::info!("Directory refreshed: {} resources (generation {})", count, generation);
        let _ = self
            .events
            .send(DirectoryEvent::Refreshed { generation, count });
        Replaced { generation, count }
    }

    /// Look up one resource
    pub async fn get(&self, id: &str) -> Result<Resource, FleetError> {
        let table = self.table.read().await;
        let Some(&pos) = table.index.get(id) else {
            return Err(FleetError::NotFound(id.to_string()));
        };
        let record = table.records[pos].lock().await;
        Ok(record.clone())
    }

    /// Copy of every resource in directory order
    pub async fn all(&self) -> DirectorySnapshot {
        let table = self.table.read().await;
        let mut resources = Vec::with_capacity(table.records.len());
        for record in &table.records {
            resources.push(record.lock().await.clone());
        }
        DirectorySnapshot {
            generation: table.generation,
            resources,
        }
    }

    /// Snapshot restricted to one id (empty when it is unknown)
    pub async fn select(&self, id: &str) -> DirectorySnapshot {
        let table = self.table.read().await;
        let resources = match table.index.get(id) {
            Some(&pos) => vec![table.records[pos].lock().await.clone()],
            None => Vec::new(),
        };
        DirectorySnapshot {
            generation: table.generation,
            resources,
        }
    }

    /// Store freshly polled status for one resource.
    ///
    /// Results from an older generation, or for ids no longer present, are
    /// dropped. Returns `true` when a field actually changed.
    pub async fn apply_status(
        &self,
        generation: u64,
        id: &str,
        power_state: PowerState,
        public_address: Option<String>,
    ) -> bool {
        let changed = {
            let table = self.table.read().await;
            if table.generation != generation {
                tracing::debug!("Dropping stale status for {} (generation {})", id, generation);
                return false;
            }
            let Some(&pos) = table.index.get(id) else {
                return false;
            };

            let mut record = table.records[pos].lock().await;
            let changed =
                record.power_state != power_state || record.public_address != public_address;
            record.power_state = power_state;
            record.public_address = public_address;
            changed
        };

        if changed {
            let _ = self.events.send(DirectoryEvent::Updated { id: id.to_string() });
        }
        changed
    }
}
