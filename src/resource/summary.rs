//! Aggregator
//!
//! Counts derived from a directory snapshot.

use super::directory::DirectorySnapshot;
use super::model::PowerState;

/// Machines of one subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionCount {
    pub subscription_id: String,
    pub subscription_name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub running: usize,
    pub stopped: usize,
    pub transitioning: usize,
    pub unknown: usize,
    /// In order of first appearance
    pub by_subscription: Vec<SubscriptionCount>,
}

impl Summary {
    pub fn from_snapshot(snapshot: &DirectorySnapshot) -> Self {
        let mut summary = Summary::default();

        for resource in snapshot {
            summary.total += 1;
            match resource.power_state {
                PowerState::Running => summary.running += 1,
                PowerState::Stopped => summary.stopped += 1,
                PowerState::Transitioning => summary.transitioning += 1,
                PowerState::Unknown => summary.unknown += 1,
            }

            match summary
                .by_subscription
                .iter_mut()
                .find(|s| s.subscription_id == resource.subscription_id)
            {
                Some(entry) => entry.count += 1,
                None => summary.by_subscription.push(SubscriptionCount {
                    subscription_id: resource.subscription_id.clone(),
                    subscription_name: resource.subscription_name.clone(),
                    count: 1,
                }),
            }
        }

        summary
    }

    pub fn count(&self, state: PowerState) -> usize {
        match state {
            PowerState::Running => self.running,
            PowerState::Stopped => self.stopped,
            PowerState::Transitioning => self.transitioning,
            PowerState::Unknown => self.unknown,
        }
    }

    /// One-line status text, e.g. `Machines: 3 | Running: 2 | Stopped: 1`
    pub fn status_line(&self) -> String {
        let mut line = format!("Machines: {}", self.total);
        for state in PowerState::ALL {
            let count = self.count(state);
            if count > 0 {
                line.push_str(&format!(" | {}: {}", state, count));
            }
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::directory::Directory;
    use crate::resource::model::{Resource, Subscription, VmDescriptor};

    fn resource(sub: &Subscription, name: &str, state: PowerState) -> Resource {
        let id = format!(
            "/subscriptions/{}/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/{}",
            sub.id, name
        );
        let mut r = Resource::from_descriptor(sub, VmDescriptor::new(&id, name));
        r.power_state = state;
        r
    }

    #[tokio::test]
    async fn test_summary_counts_states() {
        let dev = Subscription::new("s1", "Dev");
        let prod = Subscription::new("s2", "Prod");
        let directory = Directory::new();
        directory
            .replace(vec![
                resource(&dev, "a", PowerState::Running),
                resource(&prod, "b", PowerState::Stopped),
                resource(&dev, "c", PowerState::Running),
            ])
            .await;

        let summary = Summary::from_snapshot(&directory.all().await);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.running, 2);
        assert_eq!(summary.stopped, 1);
        assert_eq!(summary.transitioning, 0);
        assert_eq!(summary.unknown, 0);

        let subs: Vec<(&str, usize)> = summary
            .by_subscription
            .iter()
            .map(|s| (s.subscription_name.as_str(), s.count))
            .collect();
        assert_eq!(subs, vec![("Dev", 2), ("Prod", 1)]);
    }

    #[test]
    fn test_empty_summary_status_line() {
        let summary = Summary::from_snapshot(&DirectorySnapshot::default());
        assert_eq!(summary, Summary::default());
        assert_eq!(summary.status_line(), "Machines: 0");
    }
}
