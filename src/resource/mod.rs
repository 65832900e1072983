//! VM tracking core
//!
//! Keeps a local view of remote VMs eventually consistent with the provider
//! and issues lifecycle commands against them, independent of any UI.
//!
//! # Architecture
//!
//! - [`directory`] - Owns the tracked VMs; replaced wholesale on refresh
//! - [`poller`] - Periodically refreshes power state and public address
//! - [`dispatcher`] - Submits start/stop/restart and schedules a re-check
//! - [`summary`] - Counts per power state
//! - [`fleet`] - Facade tying the above to one [`Provider`]
//!
//! # Example
//!
//! ```ignore
//! use tazvm::resource::{Action, Fleet, FleetConfig, Scope};
//!
//! async fn restart_first(fleet: &Fleet) -> anyhow::Result<()> {
//!     fleet.refresh(&Scope::All).await?;
//!     if let Some(vm) = fleet.all().await.iter().next() {
//!         fleet.dispatch(Action::Restart, &vm.id).await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod directory;
pub mod dispatcher;
mod error;
pub mod fleet;
pub mod ident;
pub mod model;
pub mod poller;
mod provider;
pub mod summary;

pub use directory::{Directory, DirectoryEvent, DirectorySnapshot, Replaced};
pub use dispatcher::{DispatchReceipt, Dispatcher};
pub use error::FleetError;
pub use fleet::{Fleet, FleetConfig, DEFAULT_POLL_INTERVAL};
pub use model::{
    Action, PendingCommand, PowerState, Resource, Scope, Subscription, VmDescriptor,
};
pub use poller::{AutoPollHandle, PollReport, Poller};
pub use provider::{with_timeout, Provider, ProviderError};
pub use summary::{Summary, SubscriptionCount};
