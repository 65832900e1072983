//! Azure Resource Manager interaction module
//!
//! Talks to the ARM REST API and implements the core's
//! [`Provider`](crate::resource::Provider) trait on top of it.
//!
//! # Module Structure
//!
//! - [`auth`] - Bearer tokens from the Azure CLI login
//! - [`client`] - Main ARM client and URL helpers
//! - [`http`] - HTTP utilities and error mapping
//! - [`subscriptions`] - Subscription listing
//! - [`compute`] - VM listing, instance views, power operations
//! - [`network`] - Public IP lookup
//!
//! # Example
//!
//! ```ignore
//! use tazvm::azure::{auth::AzureCredentials, client::AzureClient};
//! use tazvm::resource::{Fleet, FleetConfig};
//! use std::sync::Arc;
//!
//! fn example() -> anyhow::Result<Fleet> {
//!     let client = AzureClient::new(AzureCredentials::from_environment())?;
//!     Ok(Fleet::new(Arc::new(client), FleetConfig::default()))
//! }
//! ```

pub mod auth;
pub mod client;
pub mod compute;
pub mod http;
pub mod network;
mod provider;
pub mod subscriptions;

pub use client::AzureClient;
pub use http::format_azure_error;
