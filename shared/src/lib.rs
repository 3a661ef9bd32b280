//! Vision Controller Shared Protocol Types
//!
//! This crate provides the command payloads, reply validation, framing codec
//! and error taxonomy shared by the vision controller client and its tools.

pub mod codec;
pub mod command;
pub mod error;
pub mod options;
pub mod response;
pub mod state;

// Re-export commonly used types at crate root
pub use command::{Command, CALLER_ID_KEY, COMMAND_KEY};
pub use error::{ErrorKind, TransportError, VisionError};
pub use options::{
    BackupVisionLogOptions, CommandOptions, DetectionResultImagesOptions, ResumeTaskOptions,
    StartContainerDetectionOptions, StartObjectDetectionOptions, StopTaskOptions, TaskFilter,
    TaskSelection, VisualizePointCloudOptions,
};
pub use response::{validate_response, Response};
pub use state::SystemState;

/// Default endpoints and timeouts
pub mod defaults {
    use std::time::Duration;

    /// Command port of the vision manager
    pub const COMMAND_PORT: u16 = 7004;

    /// Configuration port is the command port plus this offset
    pub const CONFIGURATION_PORT_OFFSET: u16 = 2;

    /// Status publishing port is the command port plus this offset
    pub const STATUS_PORT_OFFSET: u16 = 3;

    /// Default timeout for commands
    pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

    /// Default timeout for task and published state service queries
    pub const SERVICE_TIMEOUT: Duration = Duration::from_secs(4);

    /// Idle connections older than this are reopened before reuse
    pub const RECONNECTION_TIMEOUT: Duration = Duration::from_secs(40);

    /// Timeout for establishing a TCP connection
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    /// How often preemption and destroy signals are checked while waiting
    pub const PREEMPT_POLL_INTERVAL: Duration = Duration::from_millis(100);
}
