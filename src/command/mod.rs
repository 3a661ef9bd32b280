//! Command dispatch to the vision manager
//!
//! This module handles:
//! - Injecting the caller id and sending commands
//! - Blocking, deferred and fire-and-forget execution
//! - Validating replies into typed results
//! - The administrative configuration channel

mod configuration;
mod executor;

pub use configuration::ConfigurationChannel;
pub use executor::{CommandExecutor, ExecuteOptions};
