//! tazvm - terminal UI for Azure virtual machines
//!
//! The library holds everything except the terminal front end:
//!
//! - [`resource`] - Provider-agnostic VM tracking core ([`resource::Fleet`])
//! - [`azure`] - Azure Resource Manager implementation of [`resource::Provider`]
//! - [`config`] - Persisted user settings
//! - [`notification`] - Toasts and history for dispatched commands

pub mod azure;
pub mod config;
pub mod notification;
pub mod resource;

/// Version injected at compile time via TAZVM_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("TAZVM_VERSION") {
    Some(v) => v,
    None => "dev",
};
