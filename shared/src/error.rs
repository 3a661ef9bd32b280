//! Error taxonomy for vision manager commands
//!
//! `TransportError` covers failures of the request and state channels
//! themselves. `VisionError` is what every public client operation returns:
//! one of six kinds, each mapped to the error-type string the vision
//! manager tooling already understands.

use std::fmt;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::codec::CodecError;

/// Failures raised by a request channel or state subscriber
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Framing error: {0}")]
    Codec(#[from] CodecError),

    #[error("Failed to encode command: {0}")]
    Encode(serde_json::Error),

    #[error("Reply is not valid JSON: {0}")]
    MalformedReply(serde_json::Error),

    #[error("A reply is already outstanding on {0}")]
    Busy(String),

    #[error("No reply is outstanding")]
    NotWaiting,

    #[error("Not connected to {0}")]
    NotConnected(String),

    #[error("Connection closed by peer")]
    Closed,

    #[error("Wait preempted: {0}")]
    Preempted(String),

    #[error("Channel is being destroyed")]
    Destroyed,

    #[error("Channel has been released")]
    Released,
}

/// The kind of a [`VisionError`], independent of its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Waiting for a reply exceeded the caller's timeout
    Timeout,
    /// A wait was requested while no deferred call was outstanding
    InvalidWait,
    /// A raw reply carried no body
    EmptyResponse,
    /// The reply carried a structured `error` object
    Structured,
    /// The reply carried an `error` value of an unrecognized shape
    Unknown,
    /// Any other transport failure while sending or receiving
    Communication,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Timeout => write!(f, "Timeout"),
            ErrorKind::InvalidWait => write!(f, "InvalidWait"),
            ErrorKind::EmptyResponse => write!(f, "EmptyResponse"),
            ErrorKind::Structured => write!(f, "StructuredError"),
            ErrorKind::Unknown => write!(f, "UnknownError"),
            ErrorKind::Communication => write!(f, "CommunicationError"),
        }
    }
}

/// Typed failure of a vision manager command
#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Timed out after {timeout:?} to get response message {command} from {endpoint}")]
    Timeout {
        command: String,
        timeout: Duration,
        endpoint: String,
    },

    #[error("Waiting on command \"{command}\" when wait signal is not on")]
    InvalidWait { command: String },

    #[error("Vision command {command} failed with empty response")]
    EmptyResponse { command: String },

    #[error("{desc}")]
    Structured { desc: String, error_type: String },

    #[error("Got unknown error from vision manager: {raw}")]
    Unknown { raw: Value },

    #[error("Problem communicating with vision manager on command {command}: {source}")]
    Communication {
        command: String,
        #[source]
        source: TransportError,
    },
}

impl VisionError {
    /// Get the kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            VisionError::Timeout { .. } => ErrorKind::Timeout,
            VisionError::InvalidWait { .. } => ErrorKind::InvalidWait,
            VisionError::EmptyResponse { .. } => ErrorKind::EmptyResponse,
            VisionError::Structured { .. } => ErrorKind::Structured,
            VisionError::Unknown { .. } => ErrorKind::Unknown,
            VisionError::Communication { .. } => ErrorKind::Communication,
        }
    }

    /// Error-type string as reported to callers.
    ///
    /// Structured errors carry the remote `type` verbatim; every other kind
    /// maps to a fixed tag.
    pub fn error_type(&self) -> &str {
        match self {
            VisionError::Timeout { .. } => "timeout",
            VisionError::InvalidWait { .. } => "invalidwait",
            VisionError::EmptyResponse { .. } => "emptyresponseerror",
            VisionError::Structured { error_type, .. } => error_type,
            VisionError::Unknown { .. } => "unknownerror",
            VisionError::Communication { .. } => "communicationerror",
        }
    }

    /// Human-readable description
    pub fn description(&self) -> String {
        match self {
            VisionError::Structured { desc, .. } => desc.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind() == ErrorKind::Timeout
    }

    pub fn communication(command: &str, source: TransportError) -> Self {
        VisionError::Communication {
            command: command.to_owned(),
            source,
        }
    }
}
