//! Core data model
//!
//! Subscriptions, virtual machines and the coarse power state the rest of
//! the crate works with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Status codes reported in a VM instance view
pub const CODE_RUNNING: &str = "PowerState/running";
pub const CODE_DEALLOCATING: &str = "PowerState/deallocating";
pub const CODE_DEALLOCATED: &str = "PowerState/deallocated";
pub const CODE_RESTARTING: &str = "PowerState/restarting";

/// A billing/administrative scope at the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub display_name: String,
}

impl Subscription {
    pub fn new(id: &str, display_name: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
        }
    }

    /// Whether `key` names this subscription (by id or display name)
    pub fn matches(&self, key: &str) -> bool {
        self.id == key || self.display_name == key
    }
}

/// VM as returned by the provider's listing call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmDescriptor {
    /// Full resource identifier
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    /// Identifiers of the attached network interfaces
    #[serde(default)]
    pub network_interface_ids: Vec<String>,
}

impl VmDescriptor {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            location: None,
            network_interface_ids: Vec::new(),
        }
    }

    pub fn with_network_interface(mut self, nic_id: &str) -> Self {
        self.network_interface_ids.push(nic_id.to_string());
        self
    }
}

/// Coarse power state of a VM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PowerState {
    Running,
    Stopped,
    Transitioning,
    #[default]
    Unknown,
}

impl PowerState {
    pub const ALL: [PowerState; 4] = [
        PowerState::Running,
        PowerState::Stopped,
        PowerState::Transitioning,
        PowerState::Unknown,
    ];

    /// Derive the power state from instance-view status codes.
    ///
    /// Every code is evaluated in order and the last matching rule wins, so
    /// `[running, deallocated]` yields `Stopped`. No match yields `Unknown`.
    pub fn from_status_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = PowerState::Unknown;
        for code in codes {
            match code.as_ref() {
                CODE_RUNNING => state = PowerState::Running,
                CODE_DEALLOCATING | CODE_DEALLOCATED => state = PowerState::Stopped,
                CODE_RESTARTING => state = PowerState::Transitioning,
                _ => {},
            }
        }
        state
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Stopped => "Stopped",
            Self::Transitioning => "Transitioning",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked virtual machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub name: String,
    pub subscription_id: String,
    pub subscription_name: String,
    /// Derived from `id`; `None` when the identifier has no resource group
    pub resource_group: Option<String>,
    pub public_address: Option<String>,
    pub power_state: PowerState,
    pub descriptor: VmDescriptor,
}

impl Resource {
    /// Build a fresh record from a listing result; state starts out unknown
    pub fn from_descriptor(subscription: &Subscription, descriptor: VmDescriptor) -> Self {
        let resource_group = super::ident::resource_group(&descriptor.id).ok();
        Self {
            id: descriptor.id.clone(),
            name: descriptor.name.clone(),
            subscription_id: subscription.id.clone(),
            subscription_name: subscription.display_name.clone(),
            resource_group,
            public_address: None,
            power_state: PowerState::Unknown,
            descriptor,
        }
    }
}

/// Lifecycle command against a VM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Start,
    Stop,
    Restart,
}

impl Action {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Stop => "Stop",
            Self::Restart => "Restart",
        }
    }

    /// Name of the provider operation behind this action
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "deallocate",
            Self::Restart => "restart",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A dispatched command waiting for its follow-up status check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommand {
    pub command_id: Uuid,
    pub resource_id: String,
    pub action: Action,
    pub issued_at: DateTime<Utc>,
}

/// Which subscriptions a refresh covers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    All,
    /// One subscription, by id or display name
    Subscription(String),
}

impl Scope {
    /// Parse a user-supplied scope; "all" (any case) or empty means every subscription
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Subscription(trimmed.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::All => "all",
            Self::Subscription(key) => key,
        }
    }
}
