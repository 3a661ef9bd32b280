//! Vision Controller Client
//!
//! Client for a remote vision manager: sends commands on the command
//! channel, administrative requests on the configuration channel, and polls
//! the state published on the status channel.

pub mod client;
pub mod command;
pub mod config;
pub mod transport;

pub use client::{SubscriberFactory, VisionControllerClient};
pub use command::{CommandExecutor, ConfigurationChannel, ExecuteOptions};
pub use config::{ClientConfig, ConfigError};
pub use transport::{DestroyHandle, PreemptCheck};
pub use vision_shared::{
    defaults, Command, ErrorKind, Response, SystemState, TaskFilter, TransportError, VisionError,
};
